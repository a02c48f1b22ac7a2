// =============================================================================
// Contracts — symbol decoding and numeric expiry ordering
// =============================================================================
//
// Symbols carry the variety as a letter prefix and the expiry as a digit
// suffix: `eb2601` (YYMM) on most exchanges, `SR601` (YMM) on Zhengzhou.
// Expiries are always turned into a numeric month key before sorting.  String
// comparison of symbols is never used for ordering.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// One listed contract month with its settlement price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub symbol: String,
    pub variety: String,
    /// Normalised four-digit year/month, e.g. 2601 for January 2026.
    pub expiry_yymm: u32,
    pub price: f64,
}

impl Contract {
    /// Decode `symbol` and attach `price`.  `as_of` resolves the decade of
    /// three-digit expiries.
    pub fn parse(symbol: &str, price: f64, as_of: NaiveDate) -> Result<Self, ContractError> {
        let symbol = symbol.trim();
        let split = symbol
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ContractError::MissingExpiry(symbol.to_string()))?;
        let (prefix, digits) = symbol.split_at(split);

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ContractError::MissingVariety(symbol.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ContractError::MissingExpiry(symbol.to_string()));
        }

        let expiry_yymm = match digits.len() {
            4 => digits
                .parse::<u32>()
                .map_err(|_| ContractError::MissingExpiry(symbol.to_string()))?,
            3 => {
                let ymm = digits
                    .parse::<u32>()
                    .map_err(|_| ContractError::MissingExpiry(symbol.to_string()))?;
                let year = resolve_single_digit_year(ymm / 100, as_of);
                (year % 100) as u32 * 100 + ymm % 100
            }
            _ => return Err(ContractError::MissingExpiry(symbol.to_string())),
        };

        let month = expiry_yymm % 100;
        if !(1..=12).contains(&month) {
            return Err(ContractError::InvalidMonth {
                symbol: symbol.to_string(),
                month,
            });
        }

        Ok(Self {
            symbol: symbol.to_string(),
            variety: prefix.to_lowercase(),
            expiry_yymm,
            price,
        })
    }

    /// `year * 12 + (month - 1)`; strictly increasing in calendar order.
    pub fn month_key(&self) -> u32 {
        month_key(self.expiry_yymm)
    }

    /// Whether the price can take part in curve analysis.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Numeric month key for a four-digit YYMM expiry.  Two-digit years below 50
/// are 20YY, the rest 19YY.
pub fn month_key(expiry_yymm: u32) -> u32 {
    let yy = expiry_yymm / 100;
    let month = expiry_yymm % 100;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    year * 12 + month.saturating_sub(1)
}

/// Nearest year ending in `digit` that is not earlier than last year.
fn resolve_single_digit_year(digit: u32, as_of: NaiveDate) -> i32 {
    let current = as_of.year();
    let decade = current - current.rem_euclid(10);
    let mut year = decade + digit as i32;
    if year < current - 1 {
        year += 10;
    }
    year
}
