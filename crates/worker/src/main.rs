//! Standalone replacement sweeper.
//!
//! Runs no-show detection, offer expiry, event persistence and notification
//! delivery without serving HTTP. Deployments that scale the API horizontally
//! set `SWEEPER_ENABLED=false` on the API and run one of these instead.

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftguard_api::background::start_engine;
use shiftguard_engine::config::EngineConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shiftguard_worker=info,shiftguard_engine=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = EngineConfig::from_env();
    let shutdown_timeout = Duration::from_secs(
        std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = shiftguard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    shiftguard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let (_engine, _event_bus, background) = start_engine(pool, &config, true);
    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        grace_period_minutes = config.policy.grace_period_minutes,
        "Replacement worker started"
    );

    shutdown_signal().await;

    background.shutdown(shutdown_timeout).await;
    tracing::info!("Replacement worker stopped");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
