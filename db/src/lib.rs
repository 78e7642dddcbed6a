pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use util::config::AppConfig;

/// Opens the database named by `DATABASE_PATH`.
///
/// A plain path is treated as an SQLite file (created with its parent directory
/// if missing); anything that already looks like a DSN is used as-is.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = AppConfig::global().database_path.clone();
    let url = if path_or_url.starts_with("sqlite:") {
        path_or_url
    } else {
        // SQLite won't create intermediate dirs.
        if let Some(parent) = Path::new(&path_or_url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    let mut opts = ConnectOptions::new(url);
    opts.sqlx_logging(false);
    Database::connect(opts).await
}
