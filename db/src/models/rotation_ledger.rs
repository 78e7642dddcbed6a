use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set, SqlErr};
use serde::Serialize;

/// Audit row for one issued (or accepted) token.
///
/// Append-only: the only mutation ever applied is flipping `consumed`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "rotation_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub session_id: i64,
    pub meeting_date: NaiveDate,
    pub time_bucket: i64,
    pub rotation_sequence: i64,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meeting_session::Entity",
        from = "Column::SessionId",
        to = "super::meeting_session::Column::Id"
    )]
    Session,
}

impl Related<super::meeting_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub token: String,
    pub session_id: i64,
    pub meeting_date: NaiveDate,
    pub time_bucket: i64,
    pub rotation_sequence: i64,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl Model {
    /// Appends an entry. Re-appending a token that is already recorded returns
    /// the existing row, so replayed rotation ticks are harmless.
    pub async fn append(db: &DatabaseConnection, entry: NewLedgerEntry) -> Result<Self, DbErr> {
        let token = entry.token.clone();
        let row = ActiveModel {
            id: NotSet,
            token: Set(entry.token),
            session_id: Set(entry.session_id),
            meeting_date: Set(entry.meeting_date),
            time_bucket: Set(entry.time_bucket),
            rotation_sequence: Set(entry.rotation_sequence),
            generated_at: Set(entry.generated_at),
            expires_at: Set(entry.expires_at),
            consumed: Set(entry.consumed),
        };

        match row.insert(db).await {
            Ok(model) => Ok(model),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(session_id = entry.session_id, "ledger entry already recorded");
                Self::find_by_token(db, &token)
                    .await?
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn find_by_token(db: &DatabaseConnection, token: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Token.eq(token)).one(db).await
    }

    /// Highest-sequence entry recorded for the session.
    pub async fn latest_for_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::RotationSequence)
            .one(db)
            .await
    }

    pub async fn find_for_bucket(
        db: &DatabaseConnection,
        session_id: i64,
        time_bucket: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::TimeBucket.eq(time_bucket))
            .order_by_asc(Column::Id)
            .one(db)
            .await
    }

    pub async fn for_session(db: &DatabaseConnection, session_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::RotationSequence)
            .all(db)
            .await
    }

    /// Flags `token` as consumed. Idempotent; `None` if the token was never recorded.
    pub async fn mark_consumed(db: &DatabaseConnection, token: &str) -> Result<Option<Self>, DbErr> {
        Entity::update_many()
            .col_expr(Column::Consumed, Expr::value(true))
            .filter(Column::Token.eq(token))
            .exec(db)
            .await?;
        Self::find_by_token(db, token).await
    }
}
