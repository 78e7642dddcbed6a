use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

use crate::auth::claims::AuthUser;

fn header_or_unknown(parts: &axum::http::request::Parts, name: header::HeaderName) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned()
}

/// One line per request once it has been answered: who asked (actor id and
/// role when a valid JWT is present), from where, and how it went.
/// CORS preflights are not logged.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let actor = AuthUser::from_request_parts(&mut parts, &()).await.ok();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();
    let origin = header_or_unknown(&parts, header::ORIGIN);
    let user_agent = header_or_unknown(&parts, header::USER_AGENT);

    let started = Instant::now();
    let response = next.run(Request::from_parts(parts, body)).await;

    tracing::info!(
        %method,
        path,
        ip = %addr.ip(),
        user = actor.as_ref().map(|a| a.0.sub).unwrap_or(0),
        role = actor.as_ref().map(|a| a.0.role.to_string()).unwrap_or_else(|| "anonymous".into()),
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        origin,
        user_agent,
        "request"
    );
    response
}
