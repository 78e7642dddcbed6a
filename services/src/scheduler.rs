//! Per-session rotation loops.
//!
//! One task per active session wakes at every bucket boundary, re-checks the
//! meeting window, records the bucket's token in the ledger and pushes it to
//! display surfaces. Stopping a session cancels its task.

use crate::clock::Clock;
use crate::error::AttendanceError;
use crate::events::{self, StopReason};
use crate::policy::{MeetingPolicy, local_date};
use crate::settings::AttendanceSettings;
use crate::token;
use chrono::{DateTime, Utc};
use db::models::{group, meeting_session, rotation_ledger};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of a single rotation tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Token for the current bucket is recorded and was published.
    Rotated(rotation_ledger::Model),
    /// The window closed; the session was stopped by this tick.
    Stopped,
    /// The session was already gone or inactive.
    Inactive,
}

/// What boot recovery did with each session left active in storage.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    pub resumed: Vec<i64>,
    pub stopped: Vec<i64>,
}

struct Running {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    db: DatabaseConnection,
    ws: util::ws::WebSocketManager,
    settings: AttendanceSettings,
    clock: Arc<dyn Clock>,
    loops: Mutex<HashMap<i64, Running>>,
    generation: AtomicU64,
}

#[derive(Clone)]
pub struct RotationScheduler {
    inner: Arc<Inner>,
}

impl RotationScheduler {
    pub fn new(
        db: DatabaseConnection,
        ws: util::ws::WebSocketManager,
        settings: AttendanceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                ws,
                settings,
                clock,
                loops: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn settings(&self) -> &AttendanceSettings {
        &self.inner.settings
    }

    pub fn ws(&self) -> &util::ws::WebSocketManager {
        &self.inner.ws
    }

    /// Starts the rotation loop for `session`. Returns `false` if one is already running.
    pub async fn spawn(&self, session: &meeting_session::Model) -> bool {
        let mut loops = self.inner.loops.lock().await;
        if loops.contains_key(&session.id) {
            return false;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        loops.insert(
            session.id,
            Running {
                generation,
                cancel: cancel.clone(),
            },
        );
        drop(loops);

        let this = self.clone();
        let session_id = session.id;
        let rotation = session.rotation();
        tokio::spawn(async move { this.run(session_id, rotation, generation, cancel).await });
        true
    }

    /// Cancels the loop for `session_id`. Returns `false` if none was running.
    pub async fn cancel(&self, session_id: i64) -> bool {
        match self.inner.loops.lock().await.remove(&session_id) {
            Some(running) => {
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self, session_id: i64) -> bool {
        self.inner.loops.lock().await.contains_key(&session_id)
    }

    /// Cancels every loop. Sessions stay active in storage for boot recovery.
    pub async fn shutdown(&self) {
        let mut loops = self.inner.loops.lock().await;
        for (_, running) in loops.drain() {
            running.cancel.cancel();
        }
    }

    async fn run(self, session_id: i64, rotation: i64, generation: u64, cancel: CancellationToken) {
        tracing::info!(session_id, rotation, "rotation loop started");
        let mut failures = 0u32;

        loop {
            let wait = delay_until_next_bucket(self.inner.clock.now(), rotation);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            let now = self.inner.clock.now();
            match self.rotate_once(session_id, now).await {
                Ok(TickOutcome::Rotated(_)) => failures = 0,
                Ok(TickOutcome::Stopped) | Ok(TickOutcome::Inactive) => break,
                Err(err) => {
                    failures += 1;
                    tracing::warn!(session_id, failures, error = %err, "rotation tick failed");

                    if failures >= self.inner.settings.max_tick_failures {
                        tracing::error!(session_id, failures, "rotation keeps failing, stopping session");
                        if let Err(err) = self.stop_session(session_id, StopReason::HealthCheck, now).await {
                            tracing::error!(session_id, error = %err, "failed to stop unhealthy session");
                        }
                        break;
                    }
                }
            }
        }

        let mut loops = self.inner.loops.lock().await;
        if loops.get(&session_id).is_some_and(|r| r.generation == generation) {
            loops.remove(&session_id);
        }
        tracing::info!(session_id, "rotation loop finished");
    }

    /// Runs one tick for `session_id` at `now`. Replaying a tick for the same
    /// bucket returns the already recorded entry.
    pub async fn rotate_once(
        &self,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, AttendanceError> {
        let db = &self.inner.db;
        let Some(session) = meeting_session::Entity::find_by_id(session_id).one(db).await? else {
            return Ok(TickOutcome::Inactive);
        };
        if !session.active {
            return Ok(TickOutcome::Inactive);
        }

        if !self.window_open(&session, now).await? {
            tracing::info!(session_id, "meeting window closed, auto-stopping session");
            self.stop_session(session_id, StopReason::WindowClosed, now).await?;
            return Ok(TickOutcome::Stopped);
        }

        let entry = issue_current(db, &session, now).await?;
        tracing::debug!(
            session_id,
            rotation_sequence = entry.rotation_sequence,
            "token rotated"
        );
        events::token_rotated(&self.inner.ws, &entry, session.rotation()).await;
        Ok(TickOutcome::Rotated(entry))
    }

    /// Is `now` on the session's date and inside the buffered window of at
    /// least one of its groups?
    pub async fn window_open(
        &self,
        session: &meeting_session::Model,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let offset = self.inner.settings.offset();
        if local_date(now, offset) != session.meeting_date {
            return Ok(false);
        }

        let buffer = self.inner.settings.session_buffer();
        let policies = policies_for(&self.inner.db, &session.group_id_list()).await?;
        Ok(policies.iter().any(|p| p.window_contains(now, buffer, offset)))
    }

    /// Deactivates the session, cancels its loop and tells subscribers.
    /// Returns `false` if it was not active.
    pub async fn stop_session(
        &self,
        session_id: i64,
        reason: StopReason,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let stopped = meeting_session::Model::deactivate(&self.inner.db, session_id, now).await?;
        self.cancel(session_id).await;

        if stopped {
            tracing::info!(session_id, ?reason, "session stopped");
            events::session_stopped(&self.inner.ws, session_id, reason, now).await;
        }
        Ok(stopped)
    }

    /// Resumes or stops every session still marked active, e.g. after a restart.
    ///
    /// A session is resumed only if resuming is enabled, it belongs to today and
    /// its window is still open. Tokens for resumed sessions are re-derived from
    /// the stored secret.
    pub async fn recover(&self, now: DateTime<Utc>) -> Result<Recovery, AttendanceError> {
        let db = &self.inner.db;
        let mut report = Recovery::default();

        for session in meeting_session::Model::find_all_active(db).await? {
            let resume = self.inner.settings.resume_on_boot && self.window_open(&session, now).await?;
            if resume {
                issue_current(db, &session, now).await?;
                self.spawn(&session).await;
                tracing::info!(session_id = session.id, "resumed rotation after restart");
                report.resumed.push(session.id);
            } else {
                self.stop_session(session.id, StopReason::Recovery, now).await?;
                report.stopped.push(session.id);
            }
        }

        Ok(report)
    }
}

/// Time from `now` to the start of the next bucket. Never zero.
pub fn delay_until_next_bucket(now: DateTime<Utc>, rotation_seconds: i64) -> Duration {
    let rotation_ms = rotation_seconds.max(1) * 1000;
    let now_ms = now.timestamp_millis();
    let next = (now_ms.div_euclid(rotation_ms) + 1) * rotation_ms;
    Duration::from_millis((next - now_ms).max(1) as u64)
}

/// Ledger entry for the bucket `now` falls in, recording it first if needed.
pub(crate) async fn issue_current(
    db: &DatabaseConnection,
    session: &meeting_session::Model,
    now: DateTime<Utc>,
) -> Result<rotation_ledger::Model, DbErr> {
    let bucket = session.bucket_at(now);
    if let Some(existing) = rotation_ledger::Model::find_for_bucket(db, session.id, bucket).await? {
        return Ok(existing);
    }

    rotation_ledger::Model::append(
        db,
        rotation_ledger::NewLedgerEntry {
            token: token::issue_for(session, bucket),
            session_id: session.id,
            meeting_date: session.meeting_date,
            time_bucket: bucket,
            rotation_sequence: session.sequence_of(bucket),
            generated_at: now,
            expires_at: session.bucket_expires_at(bucket),
            consumed: false,
        },
    )
    .await
}

/// Parsed policies for `group_ids`. Groups with a malformed stored policy are
/// skipped with a warning.
pub(crate) async fn policies_for(
    db: &DatabaseConnection,
    group_ids: &[i64],
) -> Result<Vec<MeetingPolicy>, DbErr> {
    let groups = group::Model::find_by_ids(db, group_ids).await?;
    Ok(groups
        .iter()
        .filter_map(|g| match MeetingPolicy::try_from(g) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(group_id = g.id, error = %err, "skipping group with malformed policy");
                None
            }
        })
        .collect())
}
