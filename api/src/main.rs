use api::app::build_app;
use api::auth::middleware::log_request;
use api::state::AppState;
use axum::middleware::from_fn;
use migration::{Migrator, MigratorTrait};
use services::{AttendanceSettings, SystemClock};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_appender::rolling;
use util::config::AppConfig;
use util::ws::WebSocketManager;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cfg = AppConfig::global().clone();
    let _log_guard = init_logging(&cfg.log_file, &cfg.log_level, cfg.log_to_stdout);

    let db = db::connect().await.expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let settings = AttendanceSettings::from(&cfg);
    tracing::info!(
        rotation_seconds = settings.rotation_seconds,
        skew_windows = settings.skew_windows,
        utc_offset_minutes = settings.utc_offset_minutes,
        scheme = %settings.token_scheme,
        "attendance settings loaded"
    );

    let state = AppState::new(db, WebSocketManager::new(), settings, Arc::new(SystemClock));

    match state.scheduler().recover(state.now()).await {
        Ok(report) => tracing::info!(
            resumed = ?report.resumed,
            stopped = ?report.stopped,
            "recovered sessions left active"
        ),
        Err(e) => tracing::error!(error = %e, "session recovery failed"),
    }

    let app = build_app(state.clone())
        .layer(from_fn(log_request))
        .layer(CorsLayer::very_permissive());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Starting {} on http://{}", cfg.project_name, addr);

    let scheduler = state.scheduler().clone();
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down, cancelling rotation loops");
        scheduler.shutdown().await;
    })
    .await
    .expect("Server crashed");
}

fn init_logging(
    log_file: &str,
    log_level: &str,
    log_to_stdout: bool,
) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = log_to_stdout.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
    });

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("api=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
