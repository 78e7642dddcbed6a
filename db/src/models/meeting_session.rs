use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which rotation scheme a session issues tokens with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TokenScheme {
    /// Tokens are a keyed hash of the time bucket; nothing has to be stored to verify them.
    #[sea_orm(string_value = "derived")]
    Derived,
    /// Random tokens that are only valid while the ledger holds them.
    #[sea_orm(string_value = "legacy")]
    Legacy,
}

/// One facilitator-started meeting session for a calendar date.
///
/// The secret is written once at creation and never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "meeting_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub meeting_date: NaiveDate,
    /// Sorted, comma separated group ids.
    pub group_ids: String,
    pub active: bool,
    #[serde(skip_serializing)]
    pub secret: String,
    pub token_scheme: TokenScheme,
    pub rotation_seconds: i32,
    /// Time bucket the session was started in; sequence numbers count from here.
    pub start_bucket: i64,
    pub activated_by: i64,
    pub activated_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActivatedBy",
        to = "super::user::Column::Id"
    )]
    ActivatedBy,
    #[sea_orm(has_many = "super::rotation_ledger::Entity")]
    Ledger,
}

impl Related<super::rotation_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewMeetingSession<'a> {
    pub meeting_date: NaiveDate,
    pub group_ids: &'a [i64],
    pub secret_hex: &'a str,
    pub token_scheme: TokenScheme,
    pub rotation_seconds: i32,
    pub activated_by: i64,
    pub activated_at: DateTime<Utc>,
}

pub fn format_group_ids(ids: &[i64]) -> String {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Model {
    /// Inserts an active session.
    ///
    /// Fails with a unique-constraint violation if another session is already
    /// active for `meeting_date`.
    pub async fn create(db: &DatabaseConnection, new: NewMeetingSession<'_>) -> Result<Self, DbErr> {
        let rotation = new.rotation_seconds.max(1);
        ActiveModel {
            id: NotSet,
            meeting_date: Set(new.meeting_date),
            group_ids: Set(format_group_ids(new.group_ids)),
            active: Set(true),
            secret: Set(new.secret_hex.to_owned()),
            token_scheme: Set(new.token_scheme),
            rotation_seconds: Set(rotation),
            start_bucket: Set(new.activated_at.timestamp().div_euclid(i64::from(rotation))),
            activated_by: Set(new.activated_by),
            activated_at: Set(new.activated_at),
            deactivated_at: Set(None),
        }
        .insert(db)
        .await
    }

    pub async fn find_active_on(
        db: &DatabaseConnection,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::MeetingDate.eq(date))
            .filter(Column::Active.eq(true))
            .one(db)
            .await
    }

    pub async fn find_all_active(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Active.eq(true))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Flips `active` off. Returns `false` if the session was already inactive.
    pub async fn deactivate(
        db: &DatabaseConnection,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let res = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::DeactivatedAt, Expr::value(at))
            .filter(Column::Id.eq(id))
            .filter(Column::Active.eq(true))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub fn group_id_list(&self) -> Vec<i64> {
        self.group_ids
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    }

    pub fn includes_group(&self, group_id: i64) -> bool {
        self.group_id_list().contains(&group_id)
    }

    #[inline]
    pub fn rotation(&self) -> i64 {
        i64::from(self.rotation_seconds.max(1))
    }

    /// Time bucket `now` falls in.
    pub fn bucket_at(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.rotation())
    }

    /// First instant after `bucket`.
    pub fn bucket_expires_at(&self, bucket: i64) -> DateTime<Utc> {
        Utc.timestamp_opt((bucket + 1) * self.rotation(), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Rotation sequence number of `bucket`; the start bucket is sequence 1.
    pub fn sequence_of(&self, bucket: i64) -> i64 {
        bucket - self.start_bucket + 1
    }
}
