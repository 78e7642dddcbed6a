//! HTTP routes under `/api`.
//!
//! - `/health` → liveness plus a database ping (public)
//! - `/attendance` → session lifecycle and scanning (capability-guarded)

use crate::routes::{attendance::attendance_routes, health::health_routes};
use crate::state::AppState;
use axum::Router;

pub mod attendance;
pub mod common;
pub mod health;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/attendance", attendance_routes())
}
