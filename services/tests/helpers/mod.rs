#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use db::models::{group, group_member, user};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use services::{
    AttendanceRecorder, AttendanceSettings, ManualClock, RotationScheduler, SessionManager,
};
use std::sync::Arc;
use util::ws::WebSocketManager;

/// Wall-clock time on Monday 2025-09-08 in the service zone (UTC+1).
pub fn monday(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 9, 8, h, m, s)
        .unwrap()
        .with_timezone(&Utc)
}

pub struct World {
    pub db: DatabaseConnection,
    pub clock: ManualClock,
    pub scheduler: RotationScheduler,
    pub sessions: SessionManager,
    pub recorder: AttendanceRecorder,
    pub facilitator: user::Model,
    pub group: group::Model,
    pub attendees: Vec<user::Model>,
}

/// A Monday 14:00 group (60 minutes) with a facilitator and `attendees` members.
pub async fn world(attendees: usize) -> World {
    let db = setup_test_db().await;
    let settings = AttendanceSettings::default();
    let clock = ManualClock::new(monday(13, 50, 0));
    let ws = WebSocketManager::new();

    let facilitator = user::Model::create(&db, "facilitator", "fac@test.com").await.unwrap();
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

    let mut members = Vec::with_capacity(attendees);
    for i in 0..attendees {
        let u = user::Model::create(&db, &format!("attendee{i}"), &format!("a{i}@test.com"))
            .await
            .unwrap();
        group_member::Model::assign(&db, u.id, group.id).await.unwrap();
        members.push(u);
    }

    let scheduler = RotationScheduler::new(db.clone(), ws.clone(), settings.clone(), Arc::new(clock.clone()));
    let sessions = SessionManager::new(db.clone(), scheduler.clone());
    let recorder = AttendanceRecorder::new(db.clone(), ws, settings);

    World {
        db,
        clock,
        scheduler,
        sessions,
        recorder,
        facilitator,
        group,
        attendees: members,
    }
}
