// =============================================================================
// Runtime Configuration — persisted service settings with atomic save
// =============================================================================
//
// Every tunable of the seat intelligence service lives here: where the daily
// data files are, the retail seat list, strategy thresholds and cache TTL.
// The retail seat list is also editable through the API; edits are written
// back through `save`.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::EngineSettings;
use crate::error::ConfigError;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "seat_intel_config.json";

/// Largest TTL representable as a `chrono::Duration`.
const MAX_TTL_SECONDS: u64 = (i64::MAX / 1000) as u64;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_retail_seats() -> Vec<String> {
    vec![
        "东方财富".to_string(),
        "平安期货".to_string(),
        "徽商期货".to_string(),
    ]
}

fn default_display_limit() -> usize {
    20
}

fn default_informed_seat_count() -> usize {
    20
}

fn default_msd_threshold() -> f64 {
    0.05
}

fn default_msd_full_strength() -> f64 {
    0.10
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Service -------------------------------------------------------------

    /// Directory holding one `YYYYMMDD.json` file per trading day.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Seats ---------------------------------------------------------------

    /// Seats treated as retail brokerages.
    #[serde(default = "default_retail_seats")]
    pub retail_seats: Vec<String>,

    /// Seats listed in position change evidence.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Top-N seats by combined position counted as informed.
    #[serde(default = "default_informed_seat_count")]
    pub informed_seat_count: usize,

    // --- Spiderweb thresholds ------------------------------------------------

    /// |MSD| above this gives a directional signal.
    #[serde(default = "default_msd_threshold")]
    pub msd_threshold: f64,

    /// |MSD| at which strength saturates at 1.
    #[serde(default = "default_msd_full_strength")]
    pub msd_full_strength: f64,

    // --- Engine --------------------------------------------------------------

    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Evaluate varieties in parallel.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind_addr: default_bind_addr(),
            retail_seats: default_retail_seats(),
            display_limit: default_display_limit(),
            informed_seat_count: default_informed_seat_count(),
            msd_threshold: default_msd_threshold(),
            msd_full_strength: default_msd_full_strength(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            parallel: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            data_dir = %config.data_dir,
            retail_seats = ?config.retail_seats,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `SEAT_INTEL_DATA_DIR` and `SEAT_INTEL_BIND` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("SEAT_INTEL_DATA_DIR") {
            self.data_dir = dir;
        }
        if let Ok(bind) = std::env::var("SEAT_INTEL_BIND") {
            self.bind_addr = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_limit == 0 {
            return Err(ConfigError::OutOfRange {
                field: "display_limit",
                requirement: "> 0",
            });
        }
        if self.informed_seat_count == 0 {
            return Err(ConfigError::OutOfRange {
                field: "informed_seat_count",
                requirement: "> 0",
            });
        }
        if self.cache_ttl_seconds == 0 {
            return Err(ConfigError::OutOfRange {
                field: "cache_ttl_seconds",
                requirement: "> 0",
            });
        }
        if !(self.msd_threshold.is_finite() && self.msd_threshold >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "msd_threshold",
                requirement: "finite and >= 0",
            });
        }
        if !(self.msd_full_strength.is_finite() && self.msd_full_strength > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "msd_full_strength",
                requirement: "finite and > 0",
            });
        }
        // Seat names go through the same rules as API edits.
        crate::retail_seats::RetailSeatConfig::new(&self.retail_seats, 1)?;
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            display_limit: self.display_limit,
            informed_seat_count: self.informed_seat_count,
            msd_threshold: self.msd_threshold,
            msd_full_strength: self.msd_full_strength,
            cache_ttl: Duration::seconds(self.cache_ttl_seconds.min(MAX_TTL_SECONDS) as i64),
            parallel: self.parallel,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.retail_seats, vec!["东方财富", "平安期货", "徽商期货"]);
        assert_eq!(cfg.display_limit, 20);
        assert_eq!(cfg.informed_seat_count, 20);
        assert_eq!(cfg.cache_ttl_seconds, 3600);
        assert!((cfg.msd_threshold - 0.05).abs() < f64::EPSILON);
        assert!(cfg.parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "retail_seats": ["东方财富"], "cache_ttl_seconds": 60 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.retail_seats, vec!["东方财富"]);
        assert_eq!(cfg.cache_ttl_seconds, 60);
        assert_eq!(cfg.display_limit, 20);
        assert_eq!(cfg.engine_settings().cache_ttl, Duration::seconds(60));
    }

    #[test]
    fn validate_rejects_zero_ttl_and_duplicate_seats() {
        let cfg = RuntimeConfig {
            cache_ttl_seconds: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "cache_ttl_seconds",
                requirement: "> 0",
            })
        );

        let cfg = RuntimeConfig {
            retail_seats: vec!["东方财富".into(), " 东方财富 ".into()],
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DuplicateSeatName { .. })
        ));
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = std::env::temp_dir().join(format!("seat-intel-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let cfg = RuntimeConfig {
            retail_seats: vec!["平安期货".into()],
            ..RuntimeConfig::default()
        };
        cfg.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(RuntimeConfig::load(&path).unwrap(), cfg);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        assert!(RuntimeConfig::load(path).is_err());
    }
}
