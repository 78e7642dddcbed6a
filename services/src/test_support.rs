use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use db::models::{group, group_member, user};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;

/// Instant for a wall-clock time on Monday 2025-09-08 at UTC+1.
pub(crate) fn monday(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 9, 8, h, m, s)
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) struct Fixture {
    pub db: DatabaseConnection,
    pub facilitator: user::Model,
    pub attendee: user::Model,
    pub group: group::Model,
}

/// One group meeting Mondays 14:00 for an hour, with a facilitator and one member.
pub(crate) async fn fixture() -> Fixture {
    let db = setup_test_db().await;
    let facilitator = user::Model::create(&db, "facilitator", "fac@test.com").await.unwrap();
    let attendee = user::Model::create(&db, "attendee", "att@test.com").await.unwrap();
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

    Fixture {
        db,
        facilitator,
        attendee,
        group,
    }
}
