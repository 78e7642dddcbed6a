use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /api/health
///
/// `200` with `"OK"` when the database answers a ping, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<&'static str>>) {
    match state.db().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success("OK", "Health check passed")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    success: false,
                    data: "UNAVAILABLE",
                    message: "Database unavailable".into(),
                }),
            )
        }
    }
}
