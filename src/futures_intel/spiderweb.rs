// =============================================================================
// Spiderweb Strategy — informed vs uninformed positioning gap
// =============================================================================
//
// Seats are split into an "informed" group (the K largest by combined
// position) and an "uninformed" remainder.  Each group's net long ratio is
//
//   r = (sum long - sum short) / (sum long + sum short)
//
// ITS = r(informed), UTS = r(uninformed), MSD = ITS - UTS.
//
//   MSD >  threshold  =>  bullish  (large holders lean long vs the crowd)
//   MSD < -threshold  =>  bearish
//   otherwise         =>  neutral
//
// Strength scales linearly with |MSD| and saturates at `full_strength`.
// The dispersion of per-seat net change around the cross-section mean,
// normalised by open interest, is reported alongside as supporting evidence.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::{Seat, VarietySnapshot};
use crate::signals::{capped_ratio, Evidence, Signal};
use crate::types::{Direction, StrategyId};

/// Below this many seats the split is not meaningful.
const MIN_SEATS: usize = 5;

/// Position totals of one seat group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub seats: usize,
    pub long: u64,
    pub short: u64,
}

impl GroupTotals {
    fn of(seats: &[Seat]) -> Self {
        Self {
            seats: seats.len(),
            long: seats.iter().map(|s| s.long_position).sum(),
            short: seats.iter().map(|s| s.short_position).sum(),
        }
    }

    /// Net long ratio in [-1, 1]; 0 for a group holding nothing.
    pub fn net_long_ratio(&self) -> f64 {
        let gross = self.long + self.short;
        if gross == 0 {
            return 0.0;
        }
        (self.long as f64 - self.short as f64) / gross as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiderwebEvidence {
    pub its: f64,
    pub uts: f64,
    pub msd: f64,
    /// Mean squared deviation of per-seat net change, over open interest.
    pub change_dispersion: f64,
    pub informed: GroupTotals,
    pub uninformed: GroupTotals,
}

pub struct SpiderwebStrategy {
    informed_count: usize,
    threshold: f64,
    full_strength: f64,
}

impl SpiderwebStrategy {
    pub fn new(informed_count: usize, threshold: f64, full_strength: f64) -> Self {
        Self {
            informed_count: informed_count.max(1),
            threshold,
            full_strength,
        }
    }

    pub fn evaluate(&self, snapshot: &VarietySnapshot) -> Signal {
        let variety = &snapshot.variety;
        let seats = &snapshot.seats;

        if seats.len() < MIN_SEATS {
            return Signal::neutral(
                variety,
                StrategyId::Spiderweb,
                format!("only {} seats reported", seats.len()),
                Evidence::None,
            );
        }

        // Seats arrive ranked by combined position, largest first.
        let cut = self.informed_count.min(seats.len());
        let (informed, uninformed) = seats.split_at(cut);
        if uninformed.is_empty() {
            return Signal::neutral(
                variety,
                StrategyId::Spiderweb,
                format!("no seats outside the top {}", self.informed_count),
                Evidence::None,
            );
        }

        let informed = GroupTotals::of(informed);
        let uninformed = GroupTotals::of(uninformed);
        let its = informed.net_long_ratio();
        let uts = uninformed.net_long_ratio();
        let msd = its - uts;

        let direction = if msd > self.threshold {
            Direction::Bullish
        } else if msd < -self.threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        };
        let strength = capped_ratio(msd.abs(), self.full_strength);

        let reason = match direction {
            Direction::Bullish => format!("MSD={msd:.4}, informed seats lean long"),
            Direction::Bearish => format!("MSD={msd:.4}, informed seats lean short"),
            Direction::Neutral => format!("MSD={msd:.4}, no clear lean"),
        };

        let evidence = SpiderwebEvidence {
            its,
            uts,
            msd,
            change_dispersion: change_dispersion(seats, snapshot.total_position()),
            informed,
            uninformed,
        };

        debug!(
            variety = %variety,
            its,
            uts,
            msd,
            direction = %direction,
            "spiderweb evaluated"
        );

        Signal::new(
            variety,
            StrategyId::Spiderweb,
            direction,
            strength,
            reason,
            Evidence::Spiderweb(evidence),
        )
    }
}

impl Default for SpiderwebStrategy {
    fn default() -> Self {
        Self::new(20, 0.05, 0.10)
    }
}

/// Population mean squared deviation of per-seat net change, divided by
/// open interest.  Integer sums keep the value independent of seat order.
fn change_dispersion(seats: &[Seat], total_position: u64) -> f64 {
    if seats.is_empty() || total_position == 0 {
        return 0.0;
    }
    let n = seats.len() as i128;
    let sum: i128 = seats.iter().map(|s| s.net_change() as i128).sum();
    let sum_sq: i128 = seats
        .iter()
        .map(|s| {
            let x = s.net_change() as i128;
            x * x
        })
        .sum();
    // n * sum((x - mean)^2) = n * sum(x^2) - sum(x)^2
    let scaled = n * sum_sq - sum * sum;
    scaled as f64 / (n * n) as f64 / total_position as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{filler_seats, seat, snapshot};

    fn strategy() -> SpiderwebStrategy {
        SpiderwebStrategy::new(2, 0.05, 0.10)
    }

    fn evidence(signal: &Signal) -> &SpiderwebEvidence {
        match &signal.evidence {
            Evidence::Spiderweb(e) => e,
            other => panic!("unexpected evidence {other:?}"),
        }
    }

    #[test]
    fn informed_long_against_crowd_is_bullish() {
        let snap = snapshot(
            "ru",
            vec![
                seat("big1", 900, 100, 0, 0),
                seat("big2", 800, 200, 0, 0),
                seat("s1", 20, 80, 0, 0),
                seat("s2", 30, 70, 0, 0),
                seat("s3", 50, 50, 0, 0),
            ],
        );
        let signal = strategy().evaluate(&snap);
        let ev = evidence(&signal);
        // informed: 1700 long / 300 short => 0.7; uninformed: 100 / 200 => -1/3
        assert!((ev.its - 0.7).abs() < 1e-12);
        assert!((ev.uts + 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(ev.informed.seats, 2);
        assert_eq!(ev.uninformed.seats, 3);
        assert_eq!(signal.direction, Direction::Bullish);
        assert_eq!(signal.strength, 1.0);
    }

    #[test]
    fn informed_short_is_bearish() {
        let snap = snapshot(
            "ru",
            vec![
                seat("big1", 400, 600, 0, 0),
                seat("big2", 450, 550, 0, 0),
                seat("s1", 50, 50, 0, 0),
                seat("s2", 50, 50, 0, 0),
                seat("s3", 50, 50, 0, 0),
            ],
        );
        let signal = strategy().evaluate(&snap);
        // its = (850 - 1150) / 2000 = -0.15, uts = 0
        assert_eq!(signal.direction, Direction::Bearish);
        assert_eq!(signal.strength, 1.0);
    }

    #[test]
    fn strength_scales_below_saturation() {
        let snap = snapshot(
            "ru",
            vec![
                seat("big1", 530, 470, 0, 0),
                seat("big2", 530, 470, 0, 0),
                seat("s1", 50, 50, 0, 0),
                seat("s2", 50, 50, 0, 0),
                seat("s3", 50, 50, 0, 0),
            ],
        );
        let signal = strategy().evaluate(&snap);
        // its = 120 / 2000 = 0.06 => bullish at 0.6 of full strength
        assert_eq!(signal.direction, Direction::Bullish);
        assert!((signal.strength - 0.6).abs() < 1e-9);
    }

    #[test]
    fn small_gap_is_neutral() {
        let snap = snapshot(
            "ru",
            vec![
                seat("big1", 510, 490, 0, 0),
                seat("big2", 500, 500, 0, 0),
                seat("s1", 50, 50, 0, 0),
                seat("s2", 50, 50, 0, 0),
                seat("s3", 50, 50, 0, 0),
            ],
        );
        let signal = strategy().evaluate(&snap);
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.strength, 0.0);
    }

    #[test]
    fn msd_exactly_at_threshold_is_neutral() {
        let strategy = SpiderwebStrategy::new(1, 0.05, 0.10);
        for (long, short) in [(105, 95), (95, 105)] {
            let mut seats = vec![seat("big", long, short, 0, 0)];
            seats.extend(filler_seats("u", 4, 40, 40));
            let signal = strategy.evaluate(&snapshot("ru", seats));
            // its = +-10 / 200 = +-0.05, uts = 0
            assert!((evidence(&signal).msd.abs() - 0.05).abs() < 1e-12);
            assert_eq!(signal.direction, Direction::Neutral);
            assert_eq!(signal.strength, 0.0);
        }
    }

    #[test]
    fn too_few_seats_is_neutral() {
        let snap = snapshot("ru", filler_seats("f", 4, 100, 10));
        let signal = strategy().evaluate(&snap);
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.evidence, Evidence::None);
    }

    #[test]
    fn no_uninformed_seats_is_neutral() {
        let snap = snapshot("ru", filler_seats("f", 8, 100, 10));
        let signal = SpiderwebStrategy::default().evaluate(&snap);
        assert_eq!(signal.direction, Direction::Neutral);
    }

    #[test]
    fn dispersion_is_zero_when_all_seats_move_alike() {
        let seats: Vec<Seat> = (0..5).map(|i| seat(&format!("b{i}"), 10, 10, 5, 0)).collect();
        assert_eq!(change_dispersion(&seats, 100), 0.0);

        let seats = vec![seat("a", 10, 10, 10, 0), seat("b", 10, 10, -10, 0)];
        // mean 0, squared deviations 100 each => 100 / 40
        assert!((change_dispersion(&seats, 40) - 2.5).abs() < 1e-12);
    }
}
