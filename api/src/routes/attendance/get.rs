use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::common::{ActiveTokenResponse, GroupResponse, error_response};
use crate::{auth::AuthUser, response::ApiResponse, state::AppState};

/// GET /api/attendance/groups/eligible
///
/// Groups the caller manages that meet today. Admins see every group.
pub async fn get_eligible_groups(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<GroupResponse>>>) {
    match state.sessions().eligible_groups(&user.actor(), state.now()).await {
        Ok(groups) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                groups.into_iter().map(GroupResponse::from).collect(),
                "Eligible groups retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/attendance/sessions/{session_id}/token
///
/// ### Responses
/// - `200 OK` with the token to display, its sequence and expiry, and the
///   running attendance count
/// - `404 Not Found` if the session does not exist or is no longer active
pub async fn get_active_token(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<ActiveTokenResponse>>) {
    match state.sessions().active_token(session_id, state.now()).await {
        Ok(Some(token)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ActiveTokenResponse::new(session_id, token),
                "Active token retrieved",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session is not active")),
        ),
        Err(e) => error_response(e),
    }
}
