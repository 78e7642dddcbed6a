use axum::{Router, middleware::from_fn, routing::get};

use crate::auth::guards::allow_manage_session;
use crate::state::AppState;

pub mod handlers;
pub mod ws_handlers;

use handlers::attendance_session_ws_handler;

/// Display-surface sockets. Browsers pass the JWT as `?token=`.
pub fn ws_attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{session_id}", get(attendance_session_ws_handler))
        .route_layer(from_fn(allow_manage_session))
}
