use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
};
use services::events::session_topic;
use std::sync::Arc;
use util::config::AppConfig;
use util::ws::axum_adapter::ws_route;
use util::ws::serve::WsServerOptions;

use super::ws_handlers::AttendanceWsHandler;
use crate::state::AppState;

/// GET /ws/attendance/sessions/{session_id}
///
/// Subscribes to `attendance:session:{id}`: rotated tokens, marks and stops.
pub async fn attendance_session_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> impl IntoResponse {
    let opts = WsServerOptions {
        ws_ping_sec: AppConfig::global().ws_ping_seconds,
        enable_app_ping: true,
    };
    let manager = state.ws().clone();
    let handler = Arc::new(AttendanceWsHandler::new(state, session_id));

    ws_route(ws, manager, session_topic(session_id), handler, opts)
}
