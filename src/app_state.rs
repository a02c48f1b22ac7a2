// =============================================================================
// Central Application State — Seat Intelligence Service
// =============================================================================
//
// Ties the analysis engine, the active retail seat config and the persisted
// runtime config together for the HTTP layer.
//
// Thread safety:
//   - The engine and its cache manage their own interior mutability.
//   - `RetailSeatStore` swaps immutable configs behind a parking_lot RwLock.
//   - `runtime_config` is a parking_lot RwLock, written only on seat edits.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

use crate::analysis::{AnalysisEngine, CacheStats};
use crate::error::ConfigError;
use crate::market_data::PositionProvider;
use crate::retail_seats::{RetailSeatConfig, RetailSeatStore};
use crate::runtime_config::RuntimeConfig;

/// Shared across all request handlers via `Arc<AppState>`.
pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    /// Where seat edits are persisted.  `None` keeps edits in memory only.
    pub config_path: Option<PathBuf>,

    // ── Analysis ────────────────────────────────────────────────────────
    pub engine: Arc<AnalysisEngine>,
    pub retail_seats: RetailSeatStore,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub uptime_secs: u64,
    pub retail_config_version: u64,
    pub retail_seats: usize,
    pub cache: CacheStats,
}

impl AppState {
    /// Build the state from a validated runtime config.
    pub fn new(
        config: RuntimeConfig,
        provider: Arc<dyn PositionProvider>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let retail_seats = RetailSeatStore::new(&config.retail_seats)?;
        let engine = AnalysisEngine::new(provider, config.engine_settings());
        Ok(Self {
            runtime_config: Arc::new(RwLock::new(config)),
            config_path,
            engine: Arc::new(engine),
            retail_seats,
            start_time: std::time::Instant::now(),
        })
    }

    pub fn status(&self) -> ServiceStatus {
        let retail = self.retail_seats.current();
        ServiceStatus {
            uptime_secs: self.start_time.elapsed().as_secs(),
            retail_config_version: retail.version,
            retail_seats: retail.seats.len(),
            cache: self.engine.cache_stats(),
        }
    }

    /// Replace the retail seat list and write it back to the config file.
    /// A rejected list leaves everything untouched; a failed save is logged
    /// and the in-memory edit stays active.
    ///
    /// The runtime config lock is held across the swap and the save so the
    /// persisted list always matches the active one.
    pub fn update_retail_seats(
        &self,
        names: &[String],
    ) -> Result<Arc<RetailSeatConfig>, ConfigError> {
        let mut config = self.runtime_config.write();
        let updated = self.retail_seats.update(names)?;
        config.retail_seats = updated.seats.iter().cloned().collect();

        if let Some(path) = &self.config_path {
            if let Err(e) = config.save(path) {
                warn!(error = %e, "failed to persist retail seats");
            }
        }

        Ok(updated)
    }
}
