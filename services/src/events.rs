//! Push notifications for display surfaces and the marked-attendance hook.

use chrono::{DateTime, Utc};
use db::models::rotation_ledger;
use serde::Serialize;
use util::ws::{WebSocketManager, emit};

pub const TOKEN_ROTATED: &str = "attendance.token_rotated";
pub const SESSION_STOPPED: &str = "attendance.session_stopped";
pub const ATTENDANCE_MARKED: &str = "attendance.marked";

pub fn session_topic(session_id: i64) -> String {
    format!("attendance:session:{session_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    WindowClosed,
    HealthCheck,
    Recovery,
}

#[derive(Debug, Serialize)]
pub struct TokenRotated<'a> {
    pub session_id: i64,
    pub token: &'a str,
    pub rotation_sequence: i64,
    pub expires_at: DateTime<Utc>,
    pub rotation_interval_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionStopped {
    pub session_id: i64,
    pub reason: StopReason,
    pub stopped_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceMarked {
    pub session_id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub attendance_count: u64,
    pub at: DateTime<Utc>,
}

pub async fn token_rotated(ws: &WebSocketManager, entry: &rotation_ledger::Model, rotation_seconds: i64) {
    let payload = TokenRotated {
        session_id: entry.session_id,
        token: &entry.token,
        rotation_sequence: entry.rotation_sequence,
        expires_at: entry.expires_at,
        rotation_interval_seconds: rotation_seconds,
    };
    emit(ws, &session_topic(entry.session_id), TOKEN_ROTATED, &payload).await;
}

pub async fn session_stopped(ws: &WebSocketManager, session_id: i64, reason: StopReason, at: DateTime<Utc>) {
    let payload = SessionStopped {
        session_id,
        reason,
        stopped_at: at,
    };
    emit(ws, &session_topic(session_id), SESSION_STOPPED, &payload).await;
}

pub async fn attendance_marked(ws: &WebSocketManager, payload: AttendanceMarked) {
    emit(ws, &session_topic(payload.session_id), ATTENDANCE_MARKED, &payload).await;
}
