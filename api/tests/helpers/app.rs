use api::{app::build_app, auth::generate_jwt, state::AppState};
use axum::{Router, body::Body, http::Request, response::Response};
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use db::models::{group, group_member, user};
use db::test_utils::setup_test_db;
use serde_json::Value;
use services::{AttendanceSettings, ManualClock, Role};
use std::sync::{Arc, Once};
use util::config::AppConfig;
use util::ws::WebSocketManager;

fn ensure_test_env() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // SAFETY: runs once, before any test reads the environment.
        unsafe {
            std::env::set_var("APP_ENV", "test");
            std::env::set_var("JWT_SECRET", "test-secret");
            std::env::set_var("JWT_DURATION_MINUTES", "60");
            std::env::set_var("DATABASE_PATH", "data/test.db");
        }
        AppConfig::set_jwt_secret("test-secret");
    });
}

/// Wall-clock time on Monday 2025-09-08 in the service zone (UTC+1).
pub fn monday(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 9, 8, h, m, s)
        .unwrap()
        .with_timezone(&Utc)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    pub admin: user::Model,
    pub facilitator: user::Model,
    pub attendee: user::Model,
    /// An attendee with no group.
    pub stray: user::Model,
    pub group: group::Model,
}

impl TestApp {
    pub fn token_for(&self, user: &user::Model, role: Role) -> String {
        generate_jwt(user.id, role).unwrap().0
    }

    pub fn facilitator_token(&self) -> String {
        self.token_for(&self.facilitator, Role::Facilitator)
    }

    pub fn attendee_token(&self) -> String {
        self.token_for(&self.attendee, Role::Attendee)
    }
}

/// Fresh in-memory app with the clock parked at Monday 13:50 and a Monday 14:00
/// group (60 minutes) run by `facilitator` with `attendee` assigned.
pub async fn make_test_app() -> TestApp {
    ensure_test_env();

    let db = setup_test_db().await;
    let clock = ManualClock::new(monday(13, 50, 0));
    let state = AppState::new(
        db.clone(),
        WebSocketManager::new(),
        AttendanceSettings::default(),
        Arc::new(clock.clone()),
    );

    let admin = user::Model::create(&db, "admin", "admin@test.com").await.unwrap();
    let facilitator = user::Model::create(&db, "facilitator", "fac@test.com").await.unwrap();
    let attendee = user::Model::create(&db, "attendee", "att@test.com").await.unwrap();
    let stray = user::Model::create(&db, "stray", "stray@test.com").await.unwrap();

    let group = group::Model::create(
        &db,
        "Monday group",
        &[Weekday::Mon],
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        60,
        Some(facilitator.id),
    )
    .await
    .unwrap();
    group_member::Model::assign(&db, attendee.id, group.id).await.unwrap();

    TestApp {
        router: build_app(state.clone()),
        state,
        clock,
        admin,
        facilitator,
        attendee,
        stray,
        group,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => req
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    }
}

pub async fn get_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
