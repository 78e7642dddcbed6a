use crate::roles::Capability;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Everything a session or scan operation can fail with.
///
/// All variants except [`AttendanceError::Database`] are expected, user-facing
/// outcomes that the caller should re-present rather than treat as faults.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("A meeting session is already active today")]
    SessionAlreadyActive,

    #[error("None of your groups meets today")]
    NoEligibleGroupToday,

    #[error("Your group does not meet today")]
    NotMeetingToday,

    #[error("Outside the meeting window")]
    OutsideMeetingWindow,

    #[error("No active meeting session")]
    NoActiveSession,

    #[error("Invalid or expired code")]
    InvalidOrExpiredToken,

    #[error("Attendance already recorded for today")]
    AlreadyMarked,

    #[error("You are not assigned to a group")]
    NoGroupAssigned,

    #[error("Missing capability: {0}")]
    Forbidden(Capability),

    #[error("Group {0} does not exist or is not yours to manage")]
    UnknownGroup(i64),

    #[error("Malformed meeting policy: {0}")]
    MalformedPolicy(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl AttendanceError {
    /// `false` only for storage faults.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AttendanceError::Database(_))
    }
}

/// Is `err` a violation of a unique index?
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
