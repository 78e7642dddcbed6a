use crate::seed::Seeder;
use db::models::user::Model;
use fake::{Fake, faker::internet::en::SafeEmail};
use sea_orm::{DatabaseConnection, DbErr};

pub struct UserSeeder;

#[async_trait::async_trait]
impl Seeder for UserSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        // Roles travel in the JWT, so these rows carry no role column.
        Model::create(db, "admin", "admin@example.com").await?;
        Model::create(db, "facilitator1", "facilitator1@example.com").await?;
        Model::create(db, "facilitator2", "facilitator2@example.com").await?;

        for _ in 0..30 {
            let username = format!("u{:08}", fastrand::u32(..100_000_000));
            let email: String = SafeEmail().fake();
            let _ = Model::create(db, &username, &email).await;
        }
        Ok(())
    }
}
