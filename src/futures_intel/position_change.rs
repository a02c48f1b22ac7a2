// =============================================================================
// Position Change Strategy — aggregate long/short flow
// =============================================================================
//
// Sums every seat's day-over-day change on each side:
//
//   longs added   AND shorts cut   =>  bullish
//   longs cut     AND shorts added =>  bearish
//   anything else                  =>  neutral
//
// Strength is the absolute flow relative to total open interest.  Only the
// top `display_limit` seats are carried in the evidence; the aggregates always
// cover the full table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::{Seat, VarietySnapshot};
use crate::signals::{capped_ratio, Evidence, Signal};
use crate::types::{Direction, StrategyId};

/// Seat row shown in the evidence table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRow {
    pub rank: usize,
    pub name: String,
    pub long_position: u64,
    pub short_position: u64,
    pub long_change: i64,
    pub short_change: i64,
}

impl SeatRow {
    fn from_seat(rank: usize, seat: &Seat) -> Self {
        Self {
            rank,
            name: seat.name.clone(),
            long_position: seat.long_position,
            short_position: seat.short_position,
            long_change: seat.long_change,
            short_change: seat.short_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionChangeEvidence {
    pub top_seats: Vec<SeatRow>,
    pub aggregate_long_change: i64,
    pub aggregate_short_change: i64,
    pub total_long: u64,
    pub total_short: u64,
}

pub struct PositionChangeStrategy {
    display_limit: usize,
}

impl PositionChangeStrategy {
    pub fn new(display_limit: usize) -> Self {
        Self {
            display_limit: display_limit.max(1),
        }
    }

    pub fn evaluate(&self, snapshot: &VarietySnapshot) -> Signal {
        let long_chg: i64 = snapshot.seats.iter().map(|s| s.long_change).sum();
        let short_chg: i64 = snapshot.seats.iter().map(|s| s.short_change).sum();

        let direction = if long_chg > 0 && short_chg < 0 {
            Direction::Bullish
        } else if long_chg < 0 && short_chg > 0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let flow = (long_chg.unsigned_abs() + short_chg.unsigned_abs()) as f64;
        let strength = capped_ratio(flow, snapshot.total_position() as f64);

        let reason = match direction {
            Direction::Bullish => format!("longs added {long_chg}, shorts cut {}", -short_chg),
            Direction::Bearish => format!("longs cut {}, shorts added {short_chg}", -long_chg),
            Direction::Neutral => format!("long change {long_chg:+}, short change {short_chg:+}"),
        };

        let evidence = PositionChangeEvidence {
            top_seats: snapshot
                .seats
                .iter()
                .take(self.display_limit)
                .enumerate()
                .map(|(i, s)| SeatRow::from_seat(i + 1, s))
                .collect(),
            aggregate_long_change: long_chg,
            aggregate_short_change: short_chg,
            total_long: snapshot.total_long,
            total_short: snapshot.total_short,
        };

        debug!(
            variety = %snapshot.variety,
            long_chg,
            short_chg,
            direction = %direction,
            "position change evaluated"
        );

        Signal::new(
            &snapshot.variety,
            StrategyId::PositionChange,
            direction,
            strength,
            reason,
            Evidence::PositionChange(evidence),
        )
    }
}

impl Default for PositionChangeStrategy {
    fn default() -> Self {
        Self::new(20)
    }
}
