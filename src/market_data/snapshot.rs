// =============================================================================
// Seat positions — one ranked table per (variety, trading date)
// =============================================================================
//
// Exchanges publish the top long and top short holders per variety every
// trading day.  The provider merges both lists into one row per member firm
// ("seat") with its open long/short position and the change versus the prior
// trading day.  A `VarietySnapshot` ranks those seats by combined position so
// every strategy sees the same deterministic ordering regardless of how the
// provider delivered them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// A member firm's aggregated position in one variety on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    #[serde(default)]
    pub long_position: u64,
    #[serde(default)]
    pub short_position: u64,
    #[serde(default)]
    pub long_change: i64,
    #[serde(default)]
    pub short_change: i64,
}

impl Seat {
    /// Long plus short open position.
    pub fn combined_position(&self) -> u64 {
        self.long_position + self.short_position
    }

    /// Net directional change: long added minus short added.
    pub fn net_change(&self) -> i64 {
        self.long_change - self.short_change
    }
}

/// Ranked seat table for a single variety and trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarietySnapshot {
    pub variety: String,
    pub date: NaiveDate,
    /// Seats ranked by combined position, largest first.
    pub seats: Vec<Seat>,
    pub total_long: u64,
    pub total_short: u64,
}

impl VarietySnapshot {
    /// Build a snapshot whose totals are the sums over `seats`.
    pub fn new(variety: impl Into<String>, date: NaiveDate, mut seats: Vec<Seat>) -> Self {
        rank_seats(&mut seats);
        let total_long = seats.iter().map(|s| s.long_position).sum();
        let total_short = seats.iter().map(|s| s.short_position).sum();
        Self {
            variety: variety.into(),
            date,
            seats,
            total_long,
            total_short,
        }
    }

    /// Build a snapshot with exchange-wide totals that may exceed the listed
    /// seats.  Totals smaller than the seat sums are rejected.
    pub fn with_totals(
        variety: impl Into<String>,
        date: NaiveDate,
        seats: Vec<Seat>,
        total_long: u64,
        total_short: u64,
    ) -> Result<Self, ProviderError> {
        let mut snapshot = Self::new(variety, date, seats);
        if total_long < snapshot.total_long || total_short < snapshot.total_short {
            return Err(ProviderError::Malformed {
                date,
                reason: format!(
                    "{}: totals {}/{} below seat sums {}/{}",
                    snapshot.variety,
                    total_long,
                    total_short,
                    snapshot.total_long,
                    snapshot.total_short
                ),
            });
        }
        snapshot.total_long = total_long;
        snapshot.total_short = total_short;
        Ok(snapshot)
    }

    /// Total open interest used as the normalisation base for strengths.
    pub fn total_position(&self) -> u64 {
        self.total_long + self.total_short
    }

    pub fn seat(&self, name: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.name == name)
    }
}

/// Combined position descending, then name ascending so ties rank the same
/// way for every input permutation.
fn rank_seats(seats: &mut [Seat]) {
    seats.sort_by(|a, b| {
        b.combined_position()
            .cmp(&a.combined_position())
            .then_with(|| a.name.cmp(&b.name))
    });
}
