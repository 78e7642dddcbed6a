use crate::seed::Seeder;
use chrono::{NaiveTime, Weekday};
use db::models::{group, user};
use sea_orm::{DatabaseConnection, DbErr};

pub struct GroupSeeder;

const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[async_trait::async_trait]
impl Seeder for GroupSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let facilitators = [
            user::Model::find_by_username(db, "facilitator1").await?,
            user::Model::find_by_username(db, "facilitator2").await?,
        ];

        for (i, facilitator) in facilitators.iter().enumerate() {
            for slot in 0..2u8 {
                let first = fastrand::usize(..WEEKDAYS.len());
                let second = (first + 2) % WEEKDAYS.len();
                let mut days = vec![WEEKDAYS[first], WEEKDAYS[second]];
                days.sort_by_key(|d| d.num_days_from_monday());

                let hour = fastrand::u32(8..17);
                let time = NaiveTime::from_hms_opt(hour, 0, 0)
                    .ok_or_else(|| DbErr::Custom(format!("invalid meeting hour {hour}")))?;

                group::Model::create(
                    db,
                    &format!("Group {}{}", i + 1, (b'A' + slot) as char),
                    &days,
                    time,
                    [60, 90, 120][fastrand::usize(..3)],
                    facilitator.as_ref().map(|f| f.id),
                )
                .await?;
            }
        }
        Ok(())
    }
}
