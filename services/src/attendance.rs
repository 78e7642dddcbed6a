//! Token validation and the at-most-once attendance write.

use crate::error::{AttendanceError, is_unique_violation};
use crate::events::{self, AttendanceMarked};
use crate::policy::{MeetingPolicy, local_date};
use crate::roles::{Actor, Capability};
use crate::settings::AttendanceSettings;
use crate::token::{self, CapturedToken};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use db::models::attendance_record::{self, NewPresence};
use db::models::rotation_ledger::{self, NewLedgerEntry};
use db::models::{group_member, meeting_session};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use util::ws::WebSocketManager;

#[derive(Debug, Clone, Serialize)]
pub struct ScanReceipt {
    pub attendance_id: i64,
    pub session_id: i64,
    pub group_id: i64,
    pub meeting_date: NaiveDate,
    pub scanned_at: DateTime<Utc>,
}

/// A captured token that matched the session.
#[derive(Debug)]
enum Accepted {
    Derived { token: String, bucket: i64 },
    Legacy(rotation_ledger::Model),
}

#[derive(Clone)]
pub struct AttendanceRecorder {
    db: DatabaseConnection,
    ws: WebSocketManager,
    settings: AttendanceSettings,
}

impl AttendanceRecorder {
    pub fn new(db: DatabaseConnection, ws: WebSocketManager, settings: AttendanceSettings) -> Self {
        Self { db, ws, settings }
    }

    /// Records the actor as present for today if `captured` is a current token
    /// of today's session.
    ///
    /// Checks run in a fixed order: group, meeting window, existing mark,
    /// session, token. The final insert relies on the `(user, date)` unique
    /// index, so concurrent submissions for the same actor produce exactly one
    /// record and `AlreadyMarked` for the rest.
    pub async fn submit_scan(
        &self,
        actor: &Actor,
        captured: &str,
        now: DateTime<Utc>,
    ) -> Result<ScanReceipt, AttendanceError> {
        actor.authorize(Capability::Scan)?;
        let offset = self.settings.offset();
        let today = local_date(now, offset);

        let group = group_member::Model::group_for_user(&self.db, actor.id)
            .await?
            .ok_or(AttendanceError::NoGroupAssigned)?;
        let policy = MeetingPolicy::try_from(&group)?;

        if !policy.meets_on(today) {
            return Err(AttendanceError::NotMeetingToday);
        }
        if !policy.window_contains(now, self.settings.scan_buffer, offset) {
            return Err(AttendanceError::OutsideMeetingWindow);
        }

        if attendance_record::Model::exists_for(&self.db, actor.id, today).await? {
            return Err(AttendanceError::AlreadyMarked);
        }

        let session = meeting_session::Model::find_active_on(&self.db, today)
            .await?
            .filter(|s| s.includes_group(group.id))
            .ok_or(AttendanceError::NoActiveSession)?;

        let accepted = self.accept(&session, captured, now).await?;
        let ledger = self.consume(&session, accepted, now).await?;

        let record = attendance_record::Model::insert_present(
            &self.db,
            NewPresence {
                user_id: actor.id,
                meeting_date: today,
                group_id: group.id,
                session_id: session.id,
                ledger_id: Some(ledger.id),
                scanned_at: now,
            },
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AttendanceError::AlreadyMarked
            } else {
                AttendanceError::Database(err)
            }
        })?;

        tracing::info!(
            user_id = actor.id,
            session_id = session.id,
            group_id = group.id,
            rotation_sequence = ledger.rotation_sequence,
            "attendance recorded"
        );
        self.notify(&record, session.id).await;

        Ok(ScanReceipt {
            attendance_id: record.id,
            session_id: session.id,
            group_id: group.id,
            meeting_date: today,
            scanned_at: now,
        })
    }

    async fn accept(
        &self,
        session: &meeting_session::Model,
        captured: &str,
        now: DateTime<Utc>,
    ) -> Result<Accepted, AttendanceError> {
        let skew = self.settings.skew_windows;

        match CapturedToken::parse(captured).ok_or(AttendanceError::InvalidOrExpiredToken)? {
            CapturedToken::Derived(tag) => {
                let bucket = token::verify_derived(&session.secret, tag, session.bucket_at(now), skew)
                    .ok_or(AttendanceError::InvalidOrExpiredToken)?;
                Ok(Accepted::Derived {
                    token: token::derive_token(&session.secret, bucket),
                    bucket,
                })
            }
            CapturedToken::Legacy(raw) => {
                let tolerance = Duration::seconds(skew * session.rotation());
                rotation_ledger::Model::find_by_token(&self.db, raw)
                    .await?
                    .filter(|e| e.session_id == session.id)
                    .filter(|e| now <= e.expires_at + tolerance && now >= e.generated_at - tolerance)
                    .map(Accepted::Legacy)
                    .ok_or(AttendanceError::InvalidOrExpiredToken)
            }
        }
    }

    /// Flags the matched ledger entry as consumed, recording it first when the
    /// token was accepted from an adjacent bucket the scheduler has not reached.
    async fn consume(
        &self,
        session: &meeting_session::Model,
        accepted: Accepted,
        now: DateTime<Utc>,
    ) -> Result<rotation_ledger::Model, AttendanceError> {
        let token = match accepted {
            Accepted::Legacy(entry) => entry.token,
            Accepted::Derived { token, bucket } => {
                if rotation_ledger::Model::find_by_token(&self.db, &token).await?.is_none() {
                    rotation_ledger::Model::append(
                        &self.db,
                        NewLedgerEntry {
                            token: token.clone(),
                            session_id: session.id,
                            meeting_date: session.meeting_date,
                            time_bucket: bucket,
                            rotation_sequence: session.sequence_of(bucket),
                            generated_at: now,
                            expires_at: session.bucket_expires_at(bucket),
                            consumed: true,
                        },
                    )
                    .await?;
                }
                token
            }
        };

        rotation_ledger::Model::mark_consumed(&self.db, &token)
            .await?
            .ok_or(AttendanceError::InvalidOrExpiredToken)
    }

    async fn notify(&self, record: &attendance_record::Model, session_id: i64) {
        let attendance_count = match attendance_record::Model::count_for_session(&self.db, session_id).await {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "could not count attendance for notification");
                return;
            }
        };

        events::attendance_marked(
            &self.ws,
            AttendanceMarked {
                session_id,
                user_id: record.user_id,
                group_id: record.group_id,
                attendance_count,
                at: record.scanned_at.unwrap_or_else(Utc::now),
            },
        )
        .await;
    }
}
