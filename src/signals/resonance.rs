// =============================================================================
// Resonance Detector — cross-strategy agreement per variety
// =============================================================================
//
// A variety resonates in a direction when at least two strategies give a
// non-neutral signal in that direction.  Strength is the share of all
// strategies that agree.  Bullish and bearish lists are reported separately,
// strongest first, ties broken by variety name.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::signals::Signal;
use crate::types::{Direction, StrategyId};

/// Minimum number of agreeing strategies.
const MIN_AGREEING: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceResult {
    pub variety: String,
    pub direction: Direction,
    pub strategies: BTreeSet<StrategyId>,
    /// `strategies.len() / total_strategy_count`.
    pub strength: f64,
    /// Mean strength of the agreeing signals.
    pub mean_signal_strength: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResonanceReport {
    pub bullish: Vec<ResonanceResult>,
    pub bearish: Vec<ResonanceResult>,
}

pub struct ResonanceDetector {
    total_strategies: usize,
}

impl ResonanceDetector {
    pub fn new(total_strategies: usize) -> Self {
        Self {
            total_strategies: total_strategies.max(1),
        }
    }

    pub fn detect(&self, signals: &[Signal]) -> ResonanceReport {
        #[derive(Default)]
        struct Tally {
            bullish: BTreeMap<StrategyId, f64>,
            bearish: BTreeMap<StrategyId, f64>,
        }

        let mut by_variety: BTreeMap<&str, Tally> = BTreeMap::new();
        for signal in signals {
            let tally = by_variety.entry(signal.variety.as_str()).or_default();
            match signal.direction {
                Direction::Bullish => {
                    tally.bullish.insert(signal.strategy, signal.strength);
                }
                Direction::Bearish => {
                    tally.bearish.insert(signal.strategy, signal.strength);
                }
                Direction::Neutral => {}
            }
        }

        let mut report = ResonanceReport::default();
        for (variety, tally) in by_variety {
            let bull = tally.bullish.len();
            let bear = tally.bearish.len();
            let (direction, agreeing) = if bull >= MIN_AGREEING && bull > bear {
                (Direction::Bullish, tally.bullish)
            } else if bear >= MIN_AGREEING && bear > bull {
                (Direction::Bearish, tally.bearish)
            } else {
                continue;
            };

            let result = ResonanceResult {
                variety: variety.to_string(),
                direction,
                strength: agreeing.len() as f64 / self.total_strategies as f64,
                mean_signal_strength: agreeing.values().sum::<f64>() / agreeing.len() as f64,
                strategies: agreeing.into_keys().collect(),
            };
            match direction {
                Direction::Bullish => report.bullish.push(result),
                _ => report.bearish.push(result),
            }
        }

        sort_results(&mut report.bullish);
        sort_results(&mut report.bearish);
        report
    }
}

impl Default for ResonanceDetector {
    fn default() -> Self {
        Self::new(StrategyId::ALL.len())
    }
}

fn sort_results(results: &mut [ResonanceResult]) {
    results.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.variety.cmp(&b.variety))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Evidence;

    fn signal(variety: &str, strategy: StrategyId, direction: Direction) -> Signal {
        Signal::new(variety, strategy, direction, 0.5, "", Evidence::None)
    }

    #[test]
    fn two_of_three_bullish_resonates() {
        let signals = vec![
            signal("rb", StrategyId::PositionChange, Direction::Bullish),
            signal("rb", StrategyId::Spiderweb, Direction::Bullish),
            signal("rb", StrategyId::RetailReversal, Direction::Bearish),
        ];
        let report = ResonanceDetector::default().detect(&signals);
        assert!(report.bearish.is_empty());
        assert_eq!(report.bullish.len(), 1);
        let r = &report.bullish[0];
        assert_eq!(r.variety, "rb");
        assert!((r.strength - 2.0 / 3.0).abs() < 1e-12);
        assert!(r.strategies.contains(&StrategyId::PositionChange));
        assert!(r.strategies.contains(&StrategyId::Spiderweb));
    }

    #[test]
    fn single_strategy_is_not_resonance() {
        let signals = vec![
            signal("rb", StrategyId::PositionChange, Direction::Bullish),
            signal("rb", StrategyId::Spiderweb, Direction::Neutral),
            signal("rb", StrategyId::RetailReversal, Direction::Bearish),
        ];
        let report = ResonanceDetector::default().detect(&signals);
        assert!(report.bullish.is_empty());
        assert!(report.bearish.is_empty());
    }

    #[test]
    fn sorted_by_strength_then_variety() {
        let mut signals = Vec::new();
        for v in ["zn", "al"] {
            signals.push(signal(v, StrategyId::PositionChange, Direction::Bearish));
            signals.push(signal(v, StrategyId::Spiderweb, Direction::Bearish));
        }
        for id in StrategyId::ALL {
            signals.push(signal("cu", id, Direction::Bearish));
        }
        let report = ResonanceDetector::default().detect(&signals);
        let order: Vec<&str> = report.bearish.iter().map(|r| r.variety.as_str()).collect();
        assert_eq!(order, vec!["cu", "al", "zn"]);
        assert_eq!(report.bearish[0].strength, 1.0);
    }

    #[test]
    fn repeated_strategy_counts_once() {
        let signals = vec![
            signal("rb", StrategyId::PositionChange, Direction::Bullish),
            signal("rb", StrategyId::Spiderweb, Direction::Bullish),
            signal("rb", StrategyId::RetailReversal, Direction::Bearish),
            signal("rb", StrategyId::RetailReversal, Direction::Bearish),
        ];
        let report = ResonanceDetector::new(4).detect(&signals);
        assert_eq!(report.bullish.len(), 1);
        assert!((report.bullish[0].strength - 0.5).abs() < 1e-12);
    }
}
