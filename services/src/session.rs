//! Meeting session state machine: `NoSession -> Active -> Stopped`, at most one
//! active session per calendar date.

use crate::error::{AttendanceError, is_unique_violation};
use crate::events::StopReason;
use crate::policy::{MeetingPolicy, local_date};
use crate::roles::{Actor, Capability, Role};
use crate::scheduler::{RotationScheduler, issue_current};
use crate::settings::AttendanceSettings;
use crate::token;
use chrono::{DateTime, Utc};
use db::models::meeting_session::{self, NewMeetingSession, TokenScheme};
use db::models::{attendance_record, group, rotation_ledger};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session_id: i64,
    pub first_token: String,
    pub rotation_interval_seconds: i64,
    pub expires_at: DateTime<Utc>,
}

/// What a display surface shows right now.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveToken {
    pub token: String,
    pub rotation_sequence: i64,
    pub expires_at: DateTime<Utc>,
    pub attendance_count: u64,
}

#[derive(Clone)]
pub struct SessionManager {
    db: DatabaseConnection,
    scheduler: RotationScheduler,
}

impl SessionManager {
    pub fn new(db: DatabaseConnection, scheduler: RotationScheduler) -> Self {
        Self { db, scheduler }
    }

    fn settings(&self) -> &AttendanceSettings {
        self.scheduler.settings()
    }

    /// Groups the actor may run a session for, regardless of schedule.
    async fn manageable_groups(&self, actor: &Actor) -> Result<Vec<group::Model>, AttendanceError> {
        let groups = match actor.role {
            Role::Admin => group::Model::find_all(&self.db).await?,
            _ => group::Model::find_for_facilitator(&self.db, actor.id).await?,
        };
        Ok(groups)
    }

    /// Groups the actor manages that meet on today's date.
    pub async fn eligible_groups(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<group::Model>, AttendanceError> {
        actor.authorize(Capability::ManageSession)?;
        let offset = self.settings().offset();

        let groups = self.manageable_groups(actor).await?;
        Ok(groups
            .into_iter()
            .filter(|g| match MeetingPolicy::try_from(g) {
                Ok(p) => p.meets_today(now, offset),
                Err(err) => {
                    tracing::warn!(group_id = g.id, error = %err, "skipping group with malformed policy");
                    false
                }
            })
            .collect())
    }

    /// Starts today's session for `requested` groups, or for every group the
    /// actor manages when `None`.
    ///
    /// Writes the first ledger entry and starts the rotation loop.
    pub async fn start(
        &self,
        actor: &Actor,
        requested: Option<&[i64]>,
        now: DateTime<Utc>,
    ) -> Result<StartedSession, AttendanceError> {
        actor.authorize(Capability::ManageSession)?;
        let settings = self.settings();
        let offset = settings.offset();
        let today = local_date(now, offset);

        if meeting_session::Model::find_active_on(&self.db, today).await?.is_some() {
            return Err(AttendanceError::SessionAlreadyActive);
        }

        let manageable = self.manageable_groups(actor).await?;
        let candidates: Vec<&group::Model> = match requested {
            Some(ids) => ids
                .iter()
                .map(|id| {
                    manageable
                        .iter()
                        .find(|g| g.id == *id)
                        .ok_or(AttendanceError::UnknownGroup(*id))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => manageable.iter().collect(),
        };

        let meeting_today = candidates
            .into_iter()
            .map(MeetingPolicy::try_from)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|p| p.meets_on(today))
            .collect::<Vec<_>>();
        if meeting_today.is_empty() {
            return Err(AttendanceError::NoEligibleGroupToday);
        }
        if !meeting_today
            .iter()
            .any(|p| p.window_contains(now, settings.start_buffer, offset))
        {
            return Err(AttendanceError::OutsideMeetingWindow);
        }

        let group_ids: Vec<i64> = meeting_today.iter().map(|p| p.group_id).collect();
        let secret = token::generate_secret();
        let session = meeting_session::Model::create(
            &self.db,
            NewMeetingSession {
                meeting_date: today,
                group_ids: &group_ids,
                secret_hex: &secret,
                token_scheme: settings.token_scheme,
                rotation_seconds: i32::try_from(settings.rotation()).unwrap_or(i32::MAX),
                activated_by: actor.id,
                activated_at: now,
            },
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AttendanceError::SessionAlreadyActive
            } else {
                AttendanceError::Database(err)
            }
        })?;

        let first = issue_current(&self.db, &session, now).await?;
        self.scheduler.spawn(&session).await;
        crate::events::token_rotated(self.scheduler.ws(), &first, session.rotation()).await;

        tracing::info!(
            session_id = session.id,
            actor_id = actor.id,
            groups = %session.group_ids,
            "meeting session started"
        );

        Ok(StartedSession {
            session_id: session.id,
            first_token: first.token,
            rotation_interval_seconds: session.rotation(),
            expires_at: first.expires_at,
        })
    }

    /// Stops today's session. Idempotent: `false` if nothing was active.
    pub async fn stop(&self, actor: &Actor, now: DateTime<Utc>) -> Result<bool, AttendanceError> {
        actor.authorize(Capability::ManageSession)?;
        let today = local_date(now, self.settings().offset());

        let Some(session) = meeting_session::Model::find_active_on(&self.db, today).await? else {
            return Ok(false);
        };
        let stopped = self
            .scheduler
            .stop_session(session.id, StopReason::Manual, now)
            .await?;
        if stopped {
            tracing::info!(session_id = session.id, actor_id = actor.id, "meeting session stopped");
        }
        Ok(stopped)
    }

    /// Current token of an active session, or `None` if it is not active.
    ///
    /// Falls back to re-deriving the token when the scheduler has not yet
    /// recorded the current bucket.
    pub async fn active_token(
        &self,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveToken>, AttendanceError> {
        let Some(session) = meeting_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
            .filter(|s| s.active)
        else {
            return Ok(None);
        };

        let bucket = session.bucket_at(now);
        let (token, rotation_sequence, expires_at) =
            match rotation_ledger::Model::find_for_bucket(&self.db, session.id, bucket).await? {
                Some(entry) => (entry.token, entry.rotation_sequence, entry.expires_at),
                None => match session.token_scheme {
                    TokenScheme::Derived => (
                        token::derive_token(&session.secret, bucket),
                        session.sequence_of(bucket),
                        session.bucket_expires_at(bucket),
                    ),
                    TokenScheme::Legacy => {
                        match rotation_ledger::Model::latest_for_session(&self.db, session.id).await? {
                            Some(entry) => (entry.token, entry.rotation_sequence, entry.expires_at),
                            None => return Ok(None),
                        }
                    }
                },
            };

        let attendance_count = attendance_record::Model::count_for_session(&self.db, session.id).await?;
        Ok(Some(ActiveToken {
            token,
            rotation_sequence,
            expires_at,
            attendance_count,
        }))
    }
}
