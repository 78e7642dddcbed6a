pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use services::Role;
use util::config::AppConfig;

/// Signs a JWT for `user_id` acting as `role`. Returns the token and its
/// RFC 3339 expiry.
pub fn generate_jwt(
    user_id: i64,
    role: Role,
) -> Result<(String, String), jsonwebtoken::errors::Error> {
    let (secret, minutes) = {
        let cfg = AppConfig::global();
        (cfg.jwt_secret.clone(), cfg.jwt_duration_minutes)
    };

    let expiry = Utc::now() + Duration::minutes(minutes as i64);
    let claims = Claims {
        sub: user_id,
        exp: expiry.timestamp() as usize,
        role,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, expiry.to_rfc3339()))
}
