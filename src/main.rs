//! Salesboard - sales analytics dashboard
//!
//! Loads the configured sales CSVs once, then serves:
//! - An overview sheet with dataset-wide charts and counts
//! - Store, state and product-family drill-downs computed on demand

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use salesboard::config::Config;
use salesboard::dashboard::Dashboard;
use salesboard::{data, web};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = Config::load().context("failed to load config.toml")?;

    // RUST_LOG wins over the configured level
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Salesboard...");
    info!("Configuration loaded");

    // Parsing and aggregating a few million rows is CPU-bound
    let data_config = config.data.clone();
    let dashboard = tokio::task::spawn_blocking(move || -> Result<Dashboard> {
        let raw = data::load(&data_config.sources, &data_config.dtype_overrides)?;
        Ok(Dashboard::new(raw))
    })
    .await??;

    let counts = dashboard.globals().overview;
    info!(
        "Dashboard ready: {} rows, {} stores, {} families, {} states",
        dashboard.raw().len(),
        counts.stores,
        counts.families,
        counts.states
    );

    // Start web server (blocking)
    web::start_server(&config, Arc::new(dashboard)).await?;

    Ok(())
}
