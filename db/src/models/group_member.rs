use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use sea_orm::sea_query::OnConflict;

/// Membership of a user in exactly one group.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub group_id: i64,
    pub joined_at: DateTime<Utc>,
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
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Places `user_id` in `group_id`, moving them if they already belong elsewhere.
    pub async fn assign(db: &DatabaseConnection, user_id: i64, group_id: i64) -> Result<(), DbErr> {
        let row = ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
            joined_at: Set(Utc::now()),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::column(Column::UserId)
                    .update_columns([Column::GroupId, Column::JoinedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    /// The group `user_id` belongs to, if any.
    pub async fn group_for_user(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Option<super::group::Model>, DbErr> {
        let found = Entity::find_by_id(user_id)
            .find_also_related(super::group::Entity)
            .one(db)
            .await?;
        Ok(found.and_then(|(_, group)| group))
    }
}
