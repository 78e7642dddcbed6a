use axum::Router;

use crate::state::AppState;
use crate::ws::attendance::ws_attendance_routes;

pub mod attendance;

pub fn ws_routes() -> Router<AppState> {
    Router::new().nest("/attendance", ws_attendance_routes())
}
