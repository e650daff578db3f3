//! Artifact cache janitor
//!
//! Runs at bot startup or from cron: loads the persisted cache state,
//! optionally drops entries whose files vanished, evicts least-recently-used
//! artifacts until the directory fits its budget, saves, and prints a JSON
//! report.

mod config;
mod error;
mod janitor;

use crate::config::JanitorConfig;
use crate::error::Result;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("artifact_cache_janitor=info".parse()?)
        .add_directive("artifact_lru_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let config = JanitorConfig::from_env();
    info!("State file: {:?}", config.cache.state_path);
    match config.cache.max_bytes {
        Some(max) => info!("Max cache size: {} MB", max / (1024 * 1024)),
        None => info!("Max cache size: unbounded"),
    }
    info!("Size accounting: {:?}", config.cache.size_accounting);

    let report = janitor::run(config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
