// =============================================================================
// Retail Seat Reversal — contrarian read of configured retail brokers
// =============================================================================
//
// Retail-heavy brokers tend to be on the wrong side of the move.  Only seats
// named in the `RetailSeatConfig` and present in the day's table take part:
//
//   every retail seat adds shorts and does not add longs  =>  bullish
//   every retail seat adds longs and does not add shorts  =>  bearish
//   any seat dissenting                                   =>  neutral
//
// The all-or-nothing rule is intentional: one broker moving the other way
// cancels the signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::{Seat, VarietySnapshot};
use crate::retail_seats::RetailSeatConfig;
use crate::signals::{capped_ratio, Evidence, Signal};
use crate::types::{Direction, StrategyId};

/// A configured retail seat found in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailSeatMove {
    pub name: String,
    pub long_position: u64,
    pub short_position: u64,
    pub long_change: i64,
    pub short_change: i64,
    /// e.g. "long -30, short +120".
    pub summary: String,
}

impl RetailSeatMove {
    fn from_seat(seat: &Seat) -> Self {
        Self {
            name: seat.name.clone(),
            long_position: seat.long_position,
            short_position: seat.short_position,
            long_change: seat.long_change,
            short_change: seat.short_change,
            summary: format!(
                "{}, {}",
                describe_change("long", seat.long_change),
                describe_change("short", seat.short_change)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailReversalEvidence {
    pub seats: Vec<RetailSeatMove>,
    /// Configured seats that did not appear in the table.
    pub absent: Vec<String>,
    /// |sum short change - sum long change| over the retail seats.
    pub net_retail_change: u64,
    /// Retail seats' share of total open position.
    pub position_share: f64,
}

pub struct RetailSeatReversalStrategy;

impl RetailSeatReversalStrategy {
    pub fn evaluate(snapshot: &VarietySnapshot, config: &RetailSeatConfig) -> Signal {
        let variety = &snapshot.variety;
        let present: Vec<&Seat> = snapshot
            .seats
            .iter()
            .filter(|s| config.contains(&s.name))
            .collect();

        if present.is_empty() {
            return Signal::neutral(
                variety,
                StrategyId::RetailReversal,
                "no retail seats in the table",
                Evidence::None,
            );
        }

        let bullish = present
            .iter()
            .all(|s| s.short_change > 0 && s.long_change <= 0);
        let bearish = present
            .iter()
            .all(|s| s.long_change > 0 && s.short_change <= 0);

        let direction = if bullish {
            Direction::Bullish
        } else if bearish {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let long_chg: i64 = present.iter().map(|s| s.long_change).sum();
        let short_chg: i64 = present.iter().map(|s| s.short_change).sum();
        let net_retail_change = (short_chg - long_chg).unsigned_abs();
        let total = snapshot.total_position() as f64;
        let strength = capped_ratio(net_retail_change as f64, total);

        let retail_position: u64 = present.iter().map(|s| s.combined_position()).sum();
        let position_share = capped_ratio(retail_position as f64, total);

        let reason = match direction {
            Direction::Bullish => format!(
                "retail seats added {short_chg} shorts without adding longs ({:.2}% of position)",
                position_share * 100.0
            ),
            Direction::Bearish => format!(
                "retail seats added {long_chg} longs without adding shorts ({:.2}% of position)",
                position_share * 100.0
            ),
            Direction::Neutral => {
                let moves: Vec<String> = present
                    .iter()
                    .filter(|s| s.long_change != 0 || s.short_change != 0)
                    .map(|s| format!("{}({:+}/{:+})", s.name, s.long_change, s.short_change))
                    .collect();
                if moves.is_empty() {
                    "retail seats unchanged".to_string()
                } else {
                    format!("retail seats disagree: {}", moves.join(", "))
                }
            }
        };

        let evidence = RetailReversalEvidence {
            seats: present.iter().map(|s| RetailSeatMove::from_seat(s)).collect(),
            absent: config
                .seats
                .iter()
                .filter(|name| snapshot.seat(name).is_none())
                .cloned()
                .collect(),
            net_retail_change,
            position_share,
        };

        debug!(
            variety = %variety,
            retail_seats = present.len(),
            long_chg,
            short_chg,
            direction = %direction,
            "retail reversal evaluated"
        );

        Signal::new(
            variety,
            StrategyId::RetailReversal,
            direction,
            strength,
            reason,
            Evidence::RetailReversal(evidence),
        )
    }
}

fn describe_change(side: &str, change: i64) -> String {
    match change {
        0 => format!("{side} unchanged"),
        c => format!("{side} {c:+}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{seat, snapshot};

    fn config() -> RetailSeatConfig {
        RetailSeatConfig::new(["东方财富", "平安期货", "徽商期货"], 1).unwrap()
    }

    fn evidence(signal: &Signal) -> &RetailReversalEvidence {
        match &signal.evidence {
            Evidence::RetailReversal(e) => e,
            other => panic!("unexpected evidence {other:?}"),
        }
    }

    #[test]
    fn all_retail_adding_shorts_is_bullish() {
        let snap = snapshot(
            "m",
            vec![
                seat("中信期货", 5_000, 4_000, 100, 100),
                seat("东方财富", 300, 900, -20, 120),
                seat("平安期货", 200, 600, 0, 60),
                seat("徽商期货", 150, 450, -10, 40),
            ],
        );
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(signal.direction, Direction::Bullish);

        // shorts +220, longs -30 => 250 over 11_600 total
        let ev = evidence(&signal);
        assert_eq!(ev.net_retail_change, 250);
        assert!((signal.strength - 250.0 / 11_600.0).abs() < 1e-12);
        assert_eq!(ev.seats.len(), 3);
        assert!(ev.absent.is_empty());
    }

    #[test]
    fn one_dissenting_seat_forces_neutral() {
        let snap = snapshot(
            "m",
            vec![
                seat("中信期货", 5_000, 4_000, 100, 100),
                seat("东方财富", 300, 900, -20, 120),
                seat("平安期货", 200, 600, 15, 60),
                seat("徽商期货", 150, 450, -10, 40),
            ],
        );
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.strength, 0.0);
        assert!(signal.reason.contains("平安期货"));
    }

    #[test]
    fn all_retail_adding_longs_is_bearish() {
        let snap = snapshot(
            "m",
            vec![
                seat("中信期货", 800, 800, 0, 0),
                seat("东方财富", 300, 100, 50, -10),
                seat("平安期货", 200, 100, 30, 0),
            ],
        );
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(signal.direction, Direction::Bearish);
        // |(-10) - 80| = 90 over 2_300
        assert!((signal.strength - 90.0 / 2_300.0).abs() < 1e-12);
        assert_eq!(evidence(&signal).absent, vec!["徽商期货".to_string()]);
    }

    #[test]
    fn absent_seats_are_not_zero_rows() {
        // Only one configured seat reported; its move alone decides.
        let snap = snapshot(
            "m",
            vec![seat("中信期货", 800, 800, 0, 0), seat("徽商期货", 10, 90, 0, 5)],
        );
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(signal.direction, Direction::Bullish);
        assert_eq!(evidence(&signal).seats.len(), 1);
    }

    #[test]
    fn no_retail_seats_is_neutral_without_evidence() {
        let snap = snapshot("m", vec![seat("中信期货", 800, 800, 0, 50)]);
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.evidence, Evidence::None);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let config = RetailSeatConfig::new(["Retail Broker"], 1).unwrap();
        let snap = snapshot("m", vec![seat("retail broker", 10, 10, 0, 5)]);
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config);
        assert_eq!(signal.evidence, Evidence::None);
    }

    #[test]
    fn seat_summary_is_readable() {
        let snap = snapshot("m", vec![seat("东方财富", 300, 900, -20, 0)]);
        let signal = RetailSeatReversalStrategy::evaluate(&snap, &config());
        assert_eq!(evidence(&signal).seats[0].summary, "long -20, short unchanged");
    }
}
