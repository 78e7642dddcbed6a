use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use services::{
    AttendanceRecorder, AttendanceSettings, Clock, RotationScheduler, SessionManager,
};
use std::sync::Arc;
use util::ws::WebSocketManager;

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    ws: WebSocketManager,
    clock: Arc<dyn Clock>,
    scheduler: RotationScheduler,
    sessions: SessionManager,
    recorder: AttendanceRecorder,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        ws: WebSocketManager,
        settings: AttendanceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scheduler = RotationScheduler::new(db.clone(), ws.clone(), settings.clone(), clock.clone());
        let sessions = SessionManager::new(db.clone(), scheduler.clone());
        let recorder = AttendanceRecorder::new(db.clone(), ws.clone(), settings);

        Self {
            db,
            ws,
            clock,
            scheduler,
            sessions,
            recorder,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn scheduler(&self) -> &RotationScheduler {
        &self.scheduler
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn recorder(&self) -> &AttendanceRecorder {
        &self.recorder
    }
}
