use crate::response::ApiResponse;
use axum::{Json, http::StatusCode};
use db::models::group;
use serde::{Deserialize, Serialize};
use services::{ActiveToken, AttendanceError, ScanReceipt, StartedSession};
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct StartSessionReq {
    /// Defaults to every group the caller manages.
    #[validate(length(min = 1, max = 64, message = "group_ids must list between 1 and 64 groups"))]
    pub group_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScanReq {
    #[validate(length(min = 1, max = 256, message = "token must be between 1 and 256 characters"))]
    pub token: String,
}

#[derive(Debug, Serialize, Default)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub meeting_days: String,
    pub meeting_time: String,
    pub duration_minutes: i32,
    pub facilitator_id: Option<i64>,
}

impl From<group::Model> for GroupResponse {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            meeting_days: g.meeting_days,
            meeting_time: g.meeting_time,
            duration_minutes: g.duration_minutes,
            facilitator_id: g.facilitator_id,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StartedSessionResponse {
    pub session_id: i64,
    pub first_token: String,
    pub rotation_interval_seconds: i64,
    pub expires_at: String,
}

impl From<StartedSession> for StartedSessionResponse {
    fn from(s: StartedSession) -> Self {
        Self {
            session_id: s.session_id,
            first_token: s.first_token,
            rotation_interval_seconds: s.rotation_interval_seconds,
            expires_at: s.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StopSessionResponse {
    pub stopped: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct ActiveTokenResponse {
    pub session_id: i64,
    pub token: String,
    pub rotation_sequence: i64,
    pub expires_at: String,
    pub attendance_count: u64,
}

impl ActiveTokenResponse {
    pub fn new(session_id: i64, t: ActiveToken) -> Self {
        Self {
            session_id,
            token: t.token,
            rotation_sequence: t.rotation_sequence,
            expires_at: t.expires_at.to_rfc3339(),
            attendance_count: t.attendance_count,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ScanResponse {
    pub attendance_id: i64,
    pub session_id: i64,
    pub group_id: i64,
    pub meeting_date: String,
    pub scanned_at: String,
}

impl From<ScanReceipt> for ScanResponse {
    fn from(r: ScanReceipt) -> Self {
        Self {
            attendance_id: r.attendance_id,
            session_id: r.session_id,
            group_id: r.group_id,
            meeting_date: r.meeting_date.to_string(),
            scanned_at: r.scanned_at.to_rfc3339(),
        }
    }
}

pub fn status_for(err: &AttendanceError) -> StatusCode {
    match err {
        AttendanceError::SessionAlreadyActive | AttendanceError::AlreadyMarked => StatusCode::CONFLICT,
        AttendanceError::NoEligibleGroupToday
        | AttendanceError::NotMeetingToday
        | AttendanceError::OutsideMeetingWindow
        | AttendanceError::NoGroupAssigned => StatusCode::UNPROCESSABLE_ENTITY,
        AttendanceError::NoActiveSession | AttendanceError::UnknownGroup(_) => StatusCode::NOT_FOUND,
        AttendanceError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
        AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
        AttendanceError::MalformedPolicy(_) | AttendanceError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps a service error to a status and envelope. Storage faults are logged
/// and hidden behind a generic message.
pub fn error_response<T>(err: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = status_for(&err);
    let message = match &err {
        AttendanceError::Database(e) => {
            tracing::error!(error = %e, "attendance operation failed");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}
