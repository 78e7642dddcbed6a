//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub rotation_seconds: i64,
    pub session_start_early_minutes: i64,
    pub session_start_late_minutes: i64,
    pub scan_early_minutes: i64,
    pub scan_late_minutes: i64,
    pub token_skew_windows: i64,
    pub service_utc_offset_minutes: i32,
    pub scheduler_max_tick_failures: u32,
    pub resume_sessions_on_boot: bool,
    pub ws_ping_seconds: u64,
    pub token_scheme: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: var_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET is required"),
            jwt_duration_minutes: var_or("JWT_DURATION_MINUTES", 60),
            rotation_seconds: var_or("ROTATION_SECONDS", 45),
            session_start_early_minutes: var_or("SESSION_START_EARLY_MINUTES", 30),
            session_start_late_minutes: var_or("SESSION_START_LATE_MINUTES", 0),
            scan_early_minutes: var_or("SCAN_EARLY_MINUTES", 15),
            scan_late_minutes: var_or("SCAN_LATE_MINUTES", 15),
            token_skew_windows: var_or("TOKEN_SKEW_WINDOWS", 1),
            service_utc_offset_minutes: var_or("SERVICE_UTC_OFFSET_MINUTES", 60),
            scheduler_max_tick_failures: var_or("SCHEDULER_MAX_TICK_FAILURES", 5),
            resume_sessions_on_boot: env::var("RESUME_SESSIONS_ON_BOOT")
                .unwrap_or_else(|_| "true".into())
                == "true",
            ws_ping_seconds: var_or("WS_PING_SECONDS", 30),
            token_scheme: env::var("TOKEN_SCHEME").unwrap_or_else(|_| "derived".into()),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_rotation_seconds(value: i64) {
        AppConfig::set_field(|cfg| cfg.rotation_seconds = value);
    }

    pub fn set_scan_window_minutes(early: i64, late: i64) {
        AppConfig::set_field(|cfg| {
            cfg.scan_early_minutes = early;
            cfg.scan_late_minutes = late;
        });
    }

    pub fn set_token_skew_windows(value: i64) {
        AppConfig::set_field(|cfg| cfg.token_skew_windows = value);
    }

    pub fn set_resume_sessions_on_boot(value: bool) {
        AppConfig::set_field(|cfg| cfg.resume_sessions_on_boot = value);
    }

    pub fn set_token_scheme(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.token_scheme = value.into());
    }
}
