//! Analytics Dashboard API Server
//!
//! Run with: cargo run --bin analytics-dashboard
//!
//! Configuration comes from the first config file found (see
//! [`Config::load_default`]) or `--config`, with `DASHBOARD_*` environment
//! overrides. `RUST_LOG` takes precedence over `logging.level`.

use analytics_dashboard::api::{serve, AppState};
use analytics_dashboard::config::{Config, LoggingConfig};
use analytics_dashboard::storage::{seed_store, EventStore};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "analytics-dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Analytics dashboard API server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!(
        "Starting Analytics Dashboard API v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Database: {}", config.database.path);

    let store = Arc::new(
        EventStore::open(&config.database.path)
            .with_context(|| format!("Failed to open database {}", config.database.path))?,
    );

    if config.database.seed_on_empty > 0 {
        let count = config.database.seed_on_empty;
        let seed_target = Arc::clone(&store);
        let seeded = tokio::task::spawn_blocking(move || {
            if seed_target.is_empty()? {
                seed_store(&seed_target, count, rand::random()).map(Some)
            } else {
                Ok(None)
            }
        })
        .await??;

        if let Some(inserted) = seeded {
            tracing::info!(inserted, "Seeded empty database");
        }
    }

    tracing::info!(events = store.len()?, "Event store ready");

    serve(AppState::new(store, config)).await?;

    tracing::info!("Analytics Dashboard API stopped");
    Ok(())
}

/// Install the global subscriber; `json` format for production, `pretty` otherwise
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "analytics_dashboard={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
