// =============================================================================
// Seat Intel — Main Entry Point
// =============================================================================
//
// Serves futures seat-position analysis over HTTP.  Daily position and price
// files are produced by an external fetcher into `data_dir`; this process
// only reads them.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod error;
mod futures_intel;
mod market_data;
mod retail_seats;
mod runtime_config;
mod signals;
mod term_structure;
mod types;

#[cfg(test)]
mod test_helpers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::JsonFileProvider;
use crate::runtime_config::{RuntimeConfig, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Seat Intel starting up");

    let config_path = PathBuf::from(
        std::env::var("SEAT_INTEL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into()),
    );

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        data_dir = %config.data_dir,
        retail_seats = ?config.retail_seats,
        cache_ttl_seconds = config.cache_ttl_seconds,
        parallel = config.parallel,
        "Configuration ready"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let provider = Arc::new(JsonFileProvider::new(&config.data_dir));
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(
        AppState::new(config, provider, Some(config_path.clone()))
            .context("invalid retail seat configuration")?,
    );

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping");

    if let Err(e) = state.runtime_config.read().save(&config_path) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Seat Intel shut down complete.");
    Ok(())
}
