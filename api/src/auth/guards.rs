use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use services::Capability;

type GuardRejection = (StatusCode, Json<ApiResponse<Empty>>);

/// Authenticates the request and stores the `AuthUser` in its extensions.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardRejection> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

async fn allow_capability(
    req: Request<Body>,
    next: Next,
    capability: Capability,
) -> Result<Response, GuardRejection> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !user.0.role.can(capability) {
        tracing::debug!(user_id = user.0.sub, role = %user.0.role, %capability, "capability denied");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(format!("Missing capability: {capability}"))),
        ));
    }

    Ok(next.run(req).await)
}

/// Facilitators and admins.
pub async fn allow_manage_session(req: Request<Body>, next: Next) -> Result<Response, GuardRejection> {
    allow_capability(req, next, Capability::ManageSession).await
}

/// Attendees and admins.
pub async fn allow_scan(req: Request<Body>, next: Next) -> Result<Response, GuardRejection> {
    allow_capability(req, next, Capability::Scan).await
}
