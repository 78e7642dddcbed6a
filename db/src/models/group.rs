use chrono::{DateTime, NaiveTime, Utc, Weekday};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::Serialize;

/// A group that meets on a fixed weekly schedule.
///
/// `meeting_days` and `meeting_time` are only ever written from typed values by
/// [`Model::create`], so stored rows always parse back.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Comma separated weekday abbreviations, e.g. `mon,thu`.
    pub meeting_days: String,
    /// `HH:MM` in the service timezone.
    pub meeting_time: String,
    pub duration_minutes: i32,
    pub facilitator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FacilitatorId",
        to = "super::user::Column::Id"
    )]
    Facilitator,
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn format_meeting_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        meeting_days: &[Weekday],
        meeting_time: NaiveTime,
        duration_minutes: i32,
        facilitator_id: Option<i64>,
    ) -> Result<Self, DbErr> {
        if meeting_days.is_empty() {
            return Err(DbErr::Custom("A group must meet on at least one day".into()));
        }
        if duration_minutes <= 0 {
            return Err(DbErr::Custom("Meeting duration must be positive".into()));
        }

        ActiveModel {
            id: NotSet,
            name: Set(name.to_owned()),
            meeting_days: Set(format_meeting_days(meeting_days)),
            meeting_time: Set(meeting_time.format("%H:%M").to_string()),
            duration_minutes: Set(duration_minutes),
            facilitator_id: Set(facilitator_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Entity::find().order_by_asc(Column::Id).all(db).await
    }

    pub async fn find_by_ids(db: &DatabaseConnection, ids: &[i64]) -> Result<Vec<Self>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_for_facilitator(
        db: &DatabaseConnection,
        facilitator_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::FacilitatorId.eq(facilitator_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
