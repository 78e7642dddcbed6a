use axum::{
    extract::{FromRequestParts, Query},
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::collections::HashMap;
use util::config::AppConfig;

use crate::auth::claims::{AuthUser, Claims};

/// Verifies an HS256 token against `JWT_SECRET` and returns its claims.
pub fn decode_claims(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = AppConfig::global().jwt_secret.clone();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// `?token=` fallback for websocket upgrades, where browsers cannot set headers.
fn query_token(parts: &Parts) -> Option<String> {
    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut q)| q.remove("token"))
}

/// Pulls a bearer token from `Authorization` (or the `token` query parameter)
/// and decodes it.
///
/// Rejects with `401 Unauthorized` when the token is missing, malformed,
/// expired, or names an unknown role.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_owned(),
            Err(_) => query_token(parts).ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header",
            ))?,
        };

        decode_claims(&token)
            .map(AuthUser)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}
