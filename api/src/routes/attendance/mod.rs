use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::auth::guards::{allow_manage_session, allow_scan};
use crate::state::AppState;

pub mod common;
mod get;
mod post;

pub use get::{get_active_token, get_eligible_groups};
pub use post::{start_session, stop_session, submit_scan};

/// `/api/attendance` routes. Facilitator routes need `ManageSession`; `/scan`
/// needs `Scan`.
pub fn attendance_routes() -> Router<AppState> {
    let manage = Router::new()
        .route("/groups/eligible", get(get_eligible_groups))
        .route("/sessions", post(start_session))
        .route("/sessions/stop", post(stop_session))
        .route("/sessions/{session_id}/token", get(get_active_token))
        .route_layer(from_fn(allow_manage_session));

    let scan = Router::new()
        .route("/scan", post(submit_scan))
        .route_layer(from_fn(allow_scan));

    manage.merge(scan)
}
