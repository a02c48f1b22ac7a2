// =============================================================================
// Position Provider — boundary to the external data fetcher
// =============================================================================
//
// Fetching from the exchanges happens elsewhere.  The engine only consumes the
// `PositionProvider` contract: a list of varieties for a date, each variety's
// seat table and its contract prices.  Missing data is always an explicit
// `DataUnavailable`, never an empty sequence.
//
// `JsonFileProvider` reads `<data_dir>/<YYYYMMDD>.json` files written by the
// fetcher.  Tests use `InMemoryProvider`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::market_data::{Contract, Seat, VarietySnapshot};

/// Source of per-date, per-variety position and price data.
pub trait PositionProvider: Send + Sync {
    /// Varieties with any data on `date`.
    fn varieties(&self, date: NaiveDate) -> Result<Vec<String>, ProviderError>;

    /// Seat table for `variety` on `date`.
    fn positions(&self, date: NaiveDate, variety: &str) -> Result<Vec<Seat>, ProviderError>;

    /// Listed contracts and settlement prices for `variety` on `date`.
    fn contracts(&self, date: NaiveDate, variety: &str) -> Result<Vec<Contract>, ProviderError>;

    /// Ranked snapshot built from [`positions`](Self::positions).  Providers
    /// that know exchange-wide totals override this.
    fn snapshot(&self, date: NaiveDate, variety: &str) -> Result<VarietySnapshot, ProviderError> {
        let seats = self.positions(date, variety)?;
        if seats.is_empty() {
            return Err(ProviderError::unavailable(date, Some(variety), "empty seat table"));
        }
        Ok(VarietySnapshot::new(variety, date, seats))
    }
}

// =============================================================================
// On-disk / in-memory day layout
// =============================================================================

/// Everything known about one variety on one date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarietyDay {
    #[serde(default)]
    pub seats: Vec<Seat>,
    #[serde(default)]
    pub contracts: Vec<ContractQuote>,
    /// Exchange-wide open long, when the exchange publishes it.
    #[serde(default)]
    pub total_long: Option<u64>,
    #[serde(default)]
    pub total_short: Option<u64>,
}

/// Raw contract quote as exported by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractQuote {
    pub symbol: String,
    pub price: f64,
}

/// One trading day across all varieties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradingDay {
    #[serde(default)]
    pub varieties: BTreeMap<String, VarietyDay>,
}

impl TradingDay {
    fn variety(&self, date: NaiveDate, variety: &str) -> Result<&VarietyDay, ProviderError> {
        self.varieties
            .get(variety)
            .ok_or_else(|| ProviderError::unavailable(date, Some(variety), "variety not reported"))
    }

    fn varieties(&self, date: NaiveDate) -> Result<Vec<String>, ProviderError> {
        if self.varieties.is_empty() {
            return Err(ProviderError::unavailable(date, None, "no varieties reported"));
        }
        Ok(self.varieties.keys().cloned().collect())
    }

    fn seats(&self, date: NaiveDate, variety: &str) -> Result<Vec<Seat>, ProviderError> {
        let day = self.variety(date, variety)?;
        if day.seats.is_empty() {
            return Err(ProviderError::unavailable(date, Some(variety), "empty seat table"));
        }
        Ok(day.seats.clone())
    }

    fn snapshot(&self, date: NaiveDate, variety: &str) -> Result<VarietySnapshot, ProviderError> {
        let seats = self.seats(date, variety)?;
        let day = self.variety(date, variety)?;
        match (day.total_long, day.total_short) {
            (Some(long), Some(short)) => {
                VarietySnapshot::with_totals(variety, date, seats, long, short)
            }
            _ => Ok(VarietySnapshot::new(variety, date, seats)),
        }
    }

    /// Decodes quotes into contracts.  Undecodable symbols are dropped.
    fn contracts(&self, date: NaiveDate, variety: &str) -> Result<Vec<Contract>, ProviderError> {
        let day = self.variety(date, variety)?;
        if day.contracts.is_empty() {
            return Err(ProviderError::unavailable(date, Some(variety), "no contract prices"));
        }
        let contracts = day
            .contracts
            .iter()
            .filter_map(|q| match Contract::parse(&q.symbol, q.price, date) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(variety, error = %e, "dropping undecodable contract");
                    None
                }
            })
            .collect();
        Ok(contracts)
    }
}

// =============================================================================
// InMemoryProvider
// =============================================================================

/// Provider backed by `TradingDay` values held in memory.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryProvider {
    days: RwLock<BTreeMap<NaiveDate, TradingDay>>,
}

#[cfg(test)]
impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variety's data for `date`.
    pub fn insert(&self, date: NaiveDate, variety: impl Into<String>, day: VarietyDay) {
        self.days
            .write()
            .entry(date)
            .or_default()
            .varieties
            .insert(variety.into(), day);
    }

    fn with_day<T>(
        &self,
        date: NaiveDate,
        f: impl FnOnce(&TradingDay) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let days = self.days.read();
        let day = days
            .get(&date)
            .ok_or_else(|| ProviderError::unavailable(date, None, "not a trading day"))?;
        f(day)
    }
}

#[cfg(test)]
impl PositionProvider for InMemoryProvider {
    fn varieties(&self, date: NaiveDate) -> Result<Vec<String>, ProviderError> {
        self.with_day(date, |d| d.varieties(date))
    }

    fn positions(&self, date: NaiveDate, variety: &str) -> Result<Vec<Seat>, ProviderError> {
        self.with_day(date, |d| d.seats(date, variety))
    }

    fn contracts(&self, date: NaiveDate, variety: &str) -> Result<Vec<Contract>, ProviderError> {
        self.with_day(date, |d| d.contracts(date, variety))
    }

    fn snapshot(&self, date: NaiveDate, variety: &str) -> Result<VarietySnapshot, ProviderError> {
        self.with_day(date, |d| d.snapshot(date, variety))
    }
}

// =============================================================================
// JsonFileProvider
// =============================================================================

/// Last day file parsed, with the modification time it was parsed at.
struct ParsedDay {
    date: NaiveDate,
    modified: SystemTime,
    day: Arc<TradingDay>,
}

/// Provider reading one `YYYYMMDD.json` file per trading day.
///
/// One analysis asks for the same day once per variety, so the most recent
/// parse is kept and reused until the file's mtime changes.
pub struct JsonFileProvider {
    data_dir: PathBuf,
    last: RwLock<Option<ParsedDay>>,
}

impl JsonFileProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            last: RwLock::new(None),
        }
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(format!("{}.json", date.format("%Y%m%d")))
    }

    fn load_day(&self, date: NaiveDate) -> Result<Arc<TradingDay>, ProviderError> {
        let path = self.day_path(date);
        let unavailable =
            |e: std::io::Error| ProviderError::unavailable(date, None, format!("{}: {e}", path.display()));

        // Filesystems without mtime support always re-read.
        let modified = std::fs::metadata(&path).map_err(unavailable)?.modified().ok();
        if let Some(modified) = modified {
            if let Some(parsed) = self.last.read().as_ref() {
                if parsed.date == date && parsed.modified == modified {
                    return Ok(Arc::clone(&parsed.day));
                }
            }
        }

        let content = std::fs::read_to_string(&path).map_err(unavailable)?;
        let day: TradingDay = serde_json::from_str(&content).map_err(|e| ProviderError::Malformed {
            date,
            reason: format!("{}: {e}", path.display()),
        })?;
        let day = Arc::new(day);
        debug!(path = %path.display(), varieties = day.varieties.len(), "parsed day file");

        if let Some(modified) = modified {
            *self.last.write() = Some(ParsedDay {
                date,
                modified,
                day: Arc::clone(&day),
            });
        }
        Ok(day)
    }
}

impl PositionProvider for JsonFileProvider {
    fn varieties(&self, date: NaiveDate) -> Result<Vec<String>, ProviderError> {
        self.load_day(date)?.varieties(date)
    }

    fn positions(&self, date: NaiveDate, variety: &str) -> Result<Vec<Seat>, ProviderError> {
        self.load_day(date)?.seats(date, variety)
    }

    fn contracts(&self, date: NaiveDate, variety: &str) -> Result<Vec<Contract>, ProviderError> {
        self.load_day(date)?.contracts(date, variety)
    }

    fn snapshot(&self, date: NaiveDate, variety: &str) -> Result<VarietySnapshot, ProviderError> {
        self.load_day(date)?.snapshot(date, variety)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{date, seat};

    fn sample_day() -> VarietyDay {
        VarietyDay {
            seats: vec![seat("a", 100, 50, 10, -5), seat("b", 30, 80, -2, 4)],
            contracts: vec![
                ContractQuote {
                    symbol: "eb2602".into(),
                    price: 95.0,
                },
                ContractQuote {
                    symbol: "eb26x1".into(),
                    price: 1.0,
                },
                ContractQuote {
                    symbol: "eb2601".into(),
                    price: 100.0,
                },
            ],
            total_long: None,
            total_short: None,
        }
    }

    #[test]
    fn missing_date_is_unavailable_not_empty() {
        let provider = InMemoryProvider::new();
        let err = provider.varieties(date()).unwrap_err();
        assert!(matches!(err, ProviderError::DataUnavailable { variety: None, .. }));
    }

    #[test]
    fn missing_variety_is_unavailable() {
        let provider = InMemoryProvider::new();
        provider.insert(date(), "eb", sample_day());
        let err = provider.positions(date(), "rb").unwrap_err();
        assert!(matches!(
            err,
            ProviderError::DataUnavailable { variety: Some(ref v), .. } if v == "rb"
        ));
    }

    #[test]
    fn empty_seat_table_is_unavailable() {
        let provider = InMemoryProvider::new();
        provider.insert(
            date(),
            "eb",
            VarietyDay {
                seats: vec![],
                ..sample_day()
            },
        );
        assert!(provider.snapshot(date(), "eb").is_err());
        assert!(provider.contracts(date(), "eb").is_ok());
    }

    #[test]
    fn contracts_drop_undecodable_symbols() {
        let provider = InMemoryProvider::new();
        provider.insert(date(), "eb", sample_day());
        let contracts = provider.contracts(date(), "eb").unwrap();
        let symbols: Vec<&str> = contracts.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["eb2602", "eb2601"]);
    }

    #[test]
    fn snapshot_applies_exchange_totals() {
        let provider = InMemoryProvider::new();
        provider.insert(
            date(),
            "eb",
            VarietyDay {
                total_long: Some(1_000),
                total_short: Some(900),
                ..sample_day()
            },
        );
        let snapshot = provider.snapshot(date(), "eb").unwrap();
        assert_eq!(snapshot.total_long, 1_000);
        assert_eq!(snapshot.total_short, 900);
        assert_eq!(snapshot.seats[0].name, "a");
    }

    #[test]
    fn json_file_provider_reads_day_file() {
        let dir = std::env::temp_dir().join(format!("seat-intel-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut day = TradingDay::default();
        day.varieties.insert("eb".into(), sample_day());
        std::fs::write(
            dir.join("20251015.json"),
            serde_json::to_string(&day).unwrap(),
        )
        .unwrap();

        let provider = JsonFileProvider::new(&dir);
        assert_eq!(provider.varieties(date()).unwrap(), vec!["eb".to_string()]);
        assert_eq!(provider.positions(date(), "eb").unwrap().len(), 2);

        let other = NaiveDate::from_ymd_opt(2025, 10, 16).unwrap();
        assert!(matches!(
            provider.varieties(other),
            Err(ProviderError::DataUnavailable { .. })
        ));

        std::fs::write(dir.join("20251016.json"), "{not json").unwrap();
        assert!(matches!(
            provider.varieties(other),
            Err(ProviderError::Malformed { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn json_file_provider_reuses_parse_until_file_changes() {
        let dir = std::env::temp_dir().join(format!("seat-intel-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("20251015.json");
        let mut day = TradingDay::default();
        day.varieties.insert("eb".into(), sample_day());
        std::fs::write(&path, serde_json::to_string(&day).unwrap()).unwrap();

        let provider = JsonFileProvider::new(&dir);
        assert_eq!(provider.positions(date(), "eb").unwrap().len(), 2);
        let parsed_at = std::fs::metadata(&path).unwrap().modified().unwrap();

        // Same mtime: the earlier parse is served without touching the content.
        std::fs::write(&path, "{not json").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(parsed_at)
            .unwrap();
        assert_eq!(provider.varieties(date()).unwrap(), vec!["eb".to_string()]);
        assert_eq!(provider.contracts(date(), "eb").unwrap().len(), 2);

        // New mtime: the file is parsed again.
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(parsed_at + std::time::Duration::from_secs(10))
            .unwrap();
        assert!(matches!(
            provider.varieties(date()),
            Err(ProviderError::Malformed { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
