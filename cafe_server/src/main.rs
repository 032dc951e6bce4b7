//! Tournament API server.
//!
//! Loads configuration, connects to PostgreSQL, optionally runs migrations
//! and the background status sweep, then serves the HTTP API.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Error};
use cafe_core::{auth::TokenService, db::Database};
use cafe_server::{
    api::{self, AppState, tournaments::run_sweep},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tracing::{error, info, warn};

const HELP: &str = "\
Run the board-game café tournament server

USAGE:
  cafe_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/cafe_db]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 PostgreSQL connection string
  DB_MAX_CONNECTIONS           Pool size [default: 20]
  JWT_SECRET                   Token signing secret, at least 32 characters (required)
  STATUS_SWEEP_INTERVAL_SECS   Seconds between status sweeps, 0 disables [default: 0]
  METRICS_BIND                 Prometheus scrape address (e.g., 127.0.0.1:9090)
  RUN_MIGRATIONS               Apply migrations on startup [default: true]
  RUST_LOG                     Log filter [default: info,sqlx=warn,hyper=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on {}", addr);
    }

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected successfully");

    if config.run_migrations {
        db.migrate().await.context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    let tokens = TokenService::new(&config.jwt_secret)?;
    let state = AppState::new(db.clone(), tokens);

    if config.status_sweep_interval_secs > 0 {
        spawn_status_sweep(
            state.clone(),
            Duration::from_secs(config.status_sweep_interval_secs),
        );
    }

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("Server is running at http://{}. Press Ctrl+C to stop.", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Run the status sweep on a fixed interval until the process exits
fn spawn_status_sweep(state: AppState, every: Duration) {
    info!("Status sweep every {}s", every.as_secs());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = run_sweep(&state).await {
                error!("Status sweep failed: {}", e);
            }
        }
    });
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
