use std::{env, fs, path::Path, process};

mod runner;

/// `migration [up|fresh|clean]` against the SQLite file at `DATABASE_PATH`.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let Ok(db_path) = env::var("DATABASE_PATH") else {
        eprintln!("DATABASE_PATH must be set");
        process::exit(1);
    };
    let url = format!("sqlite://{db_path}?mode=rwc");

    match env::args().nth(1).as_deref() {
        None | Some("up") => {
            ensure_parent_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            ensure_parent_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
        Some("clean") => remove_db_file(&db_path),
        Some(other) => {
            eprintln!("unknown command `{other}`; expected up, fresh or clean");
            process::exit(2);
        }
    }
}

fn remove_db_file(path: &str) {
    let file = Path::new(path);
    if !file.exists() {
        println!("No database at {}", file.display());
        return;
    }
    if let Err(e) = fs::remove_file(file) {
        eprintln!("Failed to delete {}: {e}", file.display());
        process::exit(1);
    }
    println!("Deleted {}", file.display());
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create {}: {e}", parent.display());
            process::exit(1);
        }
    }
}
