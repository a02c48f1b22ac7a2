// =============================================================================
// Domain errors
// =============================================================================
//
// Every error is `Clone` so a single in-flight analysis can hand the same
// outcome to all of its waiters.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure at the position/price data boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("no data for {date}{}: {reason}", variety_suffix(.variety))]
    DataUnavailable {
        date: NaiveDate,
        variety: Option<String>,
        reason: String,
    },

    #[error("malformed data for {date}: {reason}")]
    Malformed { date: NaiveDate, reason: String },
}

impl ProviderError {
    pub fn unavailable(date: NaiveDate, variety: Option<&str>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            date,
            variety: variety.map(str::to_string),
            reason: reason.into(),
        }
    }
}

fn variety_suffix(variety: &Option<String>) -> String {
    variety
        .as_deref()
        .map(|v| format!(" / {v}"))
        .unwrap_or_default()
}

/// Rejected configuration update. The previously active config stays in force.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: empty seat name at position {index}")]
    EmptySeatName { index: usize },

    #[error("invalid configuration: duplicate seat name '{name}'")]
    DuplicateSeatName { name: String },

    #[error("invalid configuration: {field} must be {requirement}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
    },
}

/// A contract symbol that cannot be decoded into (variety, expiry).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContractError {
    #[error("contract symbol '{0}' has no variety prefix")]
    MissingVariety(String),

    #[error("contract symbol '{0}' has no 3 or 4 digit expiry suffix")]
    MissingExpiry(String),

    #[error("contract symbol '{symbol}' has invalid month {month}")]
    InvalidMonth { symbol: String, month: u32 },
}

/// Failure of a whole analysis run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no trading data for {date}: {reason}")]
    NoTradingData { date: NaiveDate, reason: String },

    #[error("analysis for {date} aborted before completion")]
    Aborted { date: NaiveDate },
}
