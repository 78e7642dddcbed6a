use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, PaginatorTrait, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    /// Written by batch jobs outside the scan path.
    #[sea_orm(string_value = "absent")]
    Absent,
}

/// One attendance mark. `(user_id, meeting_date)` is unique in storage.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub meeting_date: NaiveDate,
    pub group_id: i64,
    pub session_id: Option<i64>,
    pub ledger_id: Option<i64>,
    pub status: AttendanceStatus,
    pub scanned_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::meeting_session::Entity",
        from = "Column::SessionId",
        to = "super::meeting_session::Column::Id"
    )]
    Session,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewPresence {
    pub user_id: i64,
    pub meeting_date: NaiveDate,
    pub group_id: i64,
    pub session_id: i64,
    pub ledger_id: Option<i64>,
    pub scanned_at: DateTime<Utc>,
}

impl Model {
    pub async fn find_for(
        db: &DatabaseConnection,
        user_id: i64,
        meeting_date: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::MeetingDate.eq(meeting_date))
            .one(db)
            .await
    }

    pub async fn exists_for(
        db: &DatabaseConnection,
        user_id: i64,
        meeting_date: NaiveDate,
    ) -> Result<bool, DbErr> {
        Ok(Self::find_for(db, user_id, meeting_date).await?.is_some())
    }

    /// Inserts a `present` mark. A concurrent insert for the same user and date
    /// surfaces as `SqlErr::UniqueConstraintViolation`.
    pub async fn insert_present(db: &DatabaseConnection, new: NewPresence) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            user_id: Set(new.user_id),
            meeting_date: Set(new.meeting_date),
            group_id: Set(new.group_id),
            session_id: Set(Some(new.session_id)),
            ledger_id: Set(new.ledger_id),
            status: Set(AttendanceStatus::Present),
            scanned_at: Set(Some(new.scanned_at)),
        }
        .insert(db)
        .await
    }

    pub async fn count_for_session(db: &DatabaseConnection, session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Status.eq(AttendanceStatus::Present))
            .count(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::meeting_session::{self, NewMeetingSession, TokenScheme};
    use crate::models::{group, user};
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveTime, TimeZone, Weekday};
    use sea_orm::SqlErr;

    #[tokio::test]
    async fn second_mark_for_same_day_violates_uniqueness() {
        let db = setup_test_db().await;
        let fac = user::Model::create(&db, "fac", "fac@test.com").await.unwrap();
        let member = user::Model::create(&db, "member", "m@test.com").await.unwrap();
        let g = group::Model::create(
            &db,
            "Monday",
            &[Weekday::Mon],
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            60,
            Some(fac.id),
        )
        .await
        .unwrap();
        let when = Utc.with_ymd_and_hms(2025, 9, 8, 13, 40, 0).unwrap();
        let s = meeting_session::Model::create(
            &db,
            NewMeetingSession {
                meeting_date: when.date_naive(),
                group_ids: &[g.id],
                secret_hex: "ab",
                token_scheme: TokenScheme::Derived,
                rotation_seconds: 45,
                activated_by: fac.id,
                activated_at: when,
            },
        )
        .await
        .unwrap();

        let new = NewPresence {
            user_id: member.id,
            meeting_date: s.meeting_date,
            group_id: g.id,
            session_id: s.id,
            ledger_id: None,
            scanned_at: when,
        };

        let rec = Model::insert_present(&db, new.clone()).await.unwrap();
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert!(Model::exists_for(&db, member.id, s.meeting_date).await.unwrap());
        assert_eq!(Model::count_for_session(&db, s.id).await.unwrap(), 1);

        let err = Model::insert_present(&db, new).await.unwrap_err();
        assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));
        assert_eq!(Model::count_for_session(&db, s.id).await.unwrap(), 1);
    }
}
