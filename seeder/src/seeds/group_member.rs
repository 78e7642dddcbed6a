use crate::seed::Seeder;
use db::models::{group, group_member, user};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

pub struct GroupMemberSeeder;

#[async_trait::async_trait]
impl Seeder for GroupMemberSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let groups = group::Model::find_all(db).await?;
        if groups.is_empty() {
            return Ok(());
        }

        let attendees = user::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .filter(|u| u.username.starts_with('u'));

        // Round-robin; each attendee lands in exactly one group.
        for (i, u) in attendees.enumerate() {
            group_member::Model::assign(db, u.id, groups[i % groups.len()].id).await?;
        }
        Ok(())
    }
}
