use crate::policy::Buffer;
use chrono::{FixedOffset, Offset, Utc};
use db::models::meeting_session::TokenScheme;
use util::config::AppConfig;

/// Tunables for sessions, rotation and scanning.
///
/// Built from [`AppConfig`] at startup; services never read the global config.
#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    pub rotation_seconds: i64,
    /// Window used when a facilitator starts a session.
    pub start_buffer: Buffer,
    /// Window used when an attendee scans.
    pub scan_buffer: Buffer,
    /// Rotation intervals of skew tolerated on either side when validating.
    pub skew_windows: i64,
    pub utc_offset_minutes: i32,
    pub max_tick_failures: u32,
    pub resume_on_boot: bool,
    pub token_scheme: TokenScheme,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            rotation_seconds: 45,
            start_buffer: Buffer::new(30, 0),
            scan_buffer: Buffer::new(15, 15),
            skew_windows: 1,
            utc_offset_minutes: 60,
            max_tick_failures: 5,
            resume_on_boot: true,
            token_scheme: TokenScheme::Derived,
        }
    }
}

impl AttendanceSettings {
    /// The canonical service timezone. Falls back to UTC+1 on an out-of-range offset.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .or_else(|| FixedOffset::east_opt(3600))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Window a running session stays alive for: opens as early as a session may
    /// start and closes as late as a scan is accepted.
    pub fn session_buffer(&self) -> Buffer {
        Buffer::new(
            self.start_buffer.early_minutes.max(self.scan_buffer.early_minutes),
            self.start_buffer.late_minutes.max(self.scan_buffer.late_minutes),
        )
    }

    pub fn rotation(&self) -> i64 {
        self.rotation_seconds.max(1)
    }
}

impl From<&AppConfig> for AttendanceSettings {
    fn from(cfg: &AppConfig) -> Self {
        let token_scheme = cfg.token_scheme.parse().unwrap_or_else(|_| {
            tracing::warn!(scheme = %cfg.token_scheme, "unknown TOKEN_SCHEME, using derived");
            TokenScheme::Derived
        });

        Self {
            rotation_seconds: cfg.rotation_seconds.max(1),
            start_buffer: Buffer::new(cfg.session_start_early_minutes, cfg.session_start_late_minutes),
            scan_buffer: Buffer::new(cfg.scan_early_minutes, cfg.scan_late_minutes),
            skew_windows: cfg.token_skew_windows.max(0),
            utc_offset_minutes: cfg.service_utc_offset_minutes,
            max_tick_failures: cfg.scheduler_max_tick_failures.max(1),
            resume_on_boot: cfg.resume_sessions_on_boot,
            token_scheme,
        }
    }
}
