use axum::Router;

use crate::routes::routes;
use crate::state::AppState;
use crate::ws::ws_routes;

/// The full router: `/api/...` and `/ws/...`, without the outer logging and
/// CORS layers `main` adds.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes())
        .nest("/ws", ws_routes())
        .with_state(state)
}
