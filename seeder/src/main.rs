use crate::seed::{Seeder, run_seeder};
use crate::seeds::{group::GroupSeeder, group_member::GroupMemberSeeder, user::UserSeeder};
use migration::{Migrator, MigratorTrait};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(GroupSeeder), "Group"),
        (Box::new(GroupMemberSeeder), "GroupMember"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
