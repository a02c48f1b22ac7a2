// =============================================================================
// Strategy Boards — per-strategy bullish/bearish rankings
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::signals::Signal;
use crate::types::{Direction, StrategyId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub variety: String,
    pub strength: f64,
    pub reason: String,
}

/// Non-neutral signals of one strategy, strongest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBoard {
    pub strategy: StrategyId,
    pub bullish: Vec<BoardEntry>,
    pub bearish: Vec<BoardEntry>,
}

impl StrategyBoard {
    pub fn build(strategy: StrategyId, signals: &[Signal]) -> Self {
        let mut bullish = Vec::new();
        let mut bearish = Vec::new();
        for s in signals.iter().filter(|s| s.strategy == strategy) {
            let entry = BoardEntry {
                variety: s.variety.clone(),
                strength: s.strength,
                reason: s.reason.clone(),
            };
            match s.direction {
                Direction::Bullish => bullish.push(entry),
                Direction::Bearish => bearish.push(entry),
                Direction::Neutral => {}
            }
        }
        rank(&mut bullish);
        rank(&mut bearish);
        Self {
            strategy,
            bullish,
            bearish,
        }
    }
}

fn rank(entries: &mut [BoardEntry]) {
    entries.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.variety.cmp(&b.variety))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Evidence;

    #[test]
    fn board_filters_and_ranks() {
        let signals = vec![
            Signal::new("rb", StrategyId::PositionChange, Direction::Bullish, 0.2, "", Evidence::None),
            Signal::new("cu", StrategyId::PositionChange, Direction::Bullish, 0.6, "", Evidence::None),
            Signal::new("al", StrategyId::PositionChange, Direction::Bullish, 0.2, "", Evidence::None),
            Signal::new("zn", StrategyId::PositionChange, Direction::Neutral, 0.0, "", Evidence::None),
            Signal::new("ni", StrategyId::Spiderweb, Direction::Bearish, 0.9, "", Evidence::None),
        ];
        let board = StrategyBoard::build(StrategyId::PositionChange, &signals);
        let order: Vec<&str> = board.bullish.iter().map(|e| e.variety.as_str()).collect();
        assert_eq!(order, vec!["cu", "al", "rb"]);
        assert!(board.bearish.is_empty());
    }
}
