use axum::{Extension, Json, extract::State, http::StatusCode};
use validator::Validate;

use super::common::{
    ScanReq, ScanResponse, StartSessionReq, StartedSessionResponse, StopSessionResponse,
    error_response,
};
use crate::routes::common::format_validation_errors;
use crate::{auth::AuthUser, response::ApiResponse, state::AppState};

/// POST /api/attendance/sessions
///
/// Starts today's session. Body: `{ "group_ids": [1, 2] }`, or `{}` for every
/// group the caller manages.
///
/// ### Responses
/// - `201 Created` with the first token and its expiry
/// - `409 Conflict` if a session is already active today
/// - `422 Unprocessable Entity` if no group meets today or the setup window is closed
/// - `404 Not Found` if a requested group is unknown or not the caller's
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartSessionReq>,
) -> (StatusCode, Json<ApiResponse<StartedSessionResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    match state
        .sessions()
        .start(&user.actor(), req.group_ids.as_deref(), state.now())
        .await
    {
        Ok(started) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                StartedSessionResponse::from(started),
                "Session started",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/sessions/stop
///
/// Stops today's session. Idempotent: `stopped` is `false` when nothing was active.
pub async fn stop_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<StopSessionResponse>>) {
    match state.sessions().stop(&user.actor(), state.now()).await {
        Ok(stopped) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StopSessionResponse { stopped },
                if stopped { "Session stopped" } else { "No active session" },
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/scan
///
/// Body: `{ "token": "v2.…" }`, the decoded contents of the displayed code.
///
/// ### Responses
/// - `201 Created` with the attendance id
/// - `409 Conflict` if the caller is already marked today
/// - `400 Bad Request` for an invalid or expired token
/// - `422 Unprocessable Entity` outside the meeting window, on a non-meeting
///   day, or when the caller has no group
/// - `404 Not Found` when no session covers the caller's group
pub async fn submit_scan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ScanReq>,
) -> (StatusCode, Json<ApiResponse<ScanResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    match state
        .recorder()
        .submit_scan(&user.actor(), &req.token, state.now())
        .await
    {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                ScanResponse::from(receipt),
                "Attendance recorded",
            )),
        ),
        Err(e) => error_response(e),
    }
}
