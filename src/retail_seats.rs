// =============================================================================
// Retail Seat Configuration — versioned, validated, swapped atomically
// =============================================================================
//
// The retail seat list can be edited while the engine runs.  Each accepted
// edit produces a new immutable `RetailSeatConfig` with a higher version; the
// version is part of the analysis cache key, so results computed under an
// older list are never served for the new one.  Rejected edits leave the
// active config and its version untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Immutable snapshot of the configured retail seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailSeatConfig {
    pub seats: BTreeSet<String>,
    pub version: u64,
}

impl RetailSeatConfig {
    /// Validate `names` and build a config at `version`.
    ///
    /// Names are trimmed; an empty name or a repeated name rejects the whole
    /// list.  Matching against seat names stays case-sensitive.
    pub fn new<I, S>(names: I, version: u64) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seats = BTreeSet::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(ConfigError::EmptySeatName { index });
            }
            if !seats.insert(name.to_string()) {
                return Err(ConfigError::DuplicateSeatName {
                    name: name.to_string(),
                });
            }
        }
        Ok(Self { seats, version })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seats.contains(name)
    }
}

/// Holder of the active retail seat config.
pub struct RetailSeatStore {
    current: RwLock<Arc<RetailSeatConfig>>,
}

impl RetailSeatStore {
    /// Start at version 1 with `names`.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = RetailSeatConfig::new(names, 1)?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// The active config.
    pub fn current(&self) -> Arc<RetailSeatConfig> {
        self.current.read().clone()
    }

    /// Replace the seat list.  An identical list keeps the current version;
    /// anything else bumps it by one.
    pub fn update<I, S>(&self, names: I) -> Result<Arc<RetailSeatConfig>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = self.current.write();
        let candidate = RetailSeatConfig::new(names, current.version + 1)?;

        if candidate.seats == current.seats {
            return Ok(current.clone());
        }

        info!(
            version = candidate.version,
            seats = ?candidate.seats,
            "retail seat config updated"
        );
        *current = Arc::new(candidate);
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_duplicate_names() {
        assert_eq!(
            RetailSeatConfig::new(["东方财富", "  "], 1).unwrap_err(),
            ConfigError::EmptySeatName { index: 1 }
        );
        assert_eq!(
            RetailSeatConfig::new(["东方财富", " 东方财富"], 1).unwrap_err(),
            ConfigError::DuplicateSeatName {
                name: "东方财富".to_string()
            }
        );
    }

    #[test]
    fn update_bumps_version() {
        let store = RetailSeatStore::new(["东方财富"]).unwrap();
        assert_eq!(store.current().version, 1);

        let next = store.update(["东方财富", "平安期货"]).unwrap();
        assert_eq!(next.version, 2);
        assert!(next.contains("平安期货"));
        assert_eq!(store.current().version, 2);
    }

    #[test]
    fn invalid_update_keeps_previous_config() {
        let store = RetailSeatStore::new(["东方财富", "平安期货"]).unwrap();
        assert!(store.update(["徽商期货", "徽商期货"]).is_err());
        assert!(store.update([""]).is_err());

        let current = store.current();
        assert_eq!(current.version, 1);
        assert_eq!(current.seats.len(), 2);
        assert!(current.contains("东方财富"));
    }

    #[test]
    fn identical_update_keeps_version() {
        let store = RetailSeatStore::new(["平安期货", "东方财富"]).unwrap();
        let same = store.update(["东方财富", "平安期货"]).unwrap();
        assert_eq!(same.version, 1);
    }

    #[test]
    fn empty_list_is_allowed() {
        let store = RetailSeatStore::new(Vec::<String>::new()).unwrap();
        assert!(store.current().seats.is_empty());
    }
}
