// =============================================================================
// Signals Module
// =============================================================================
//
// The common currency between strategies and everything downstream:
// - `Signal`: one strategy's verdict for one variety, with its evidence
// - Resonance: cross-strategy agreement per variety
// - Signal boards: per-strategy bullish/bearish rankings

pub mod board;
pub mod resonance;

pub use board::StrategyBoard;
pub use resonance::{ResonanceDetector, ResonanceReport};

use serde::{Deserialize, Serialize};

use crate::futures_intel::{PositionChangeEvidence, RetailReversalEvidence, SpiderwebEvidence};
use crate::types::{Direction, StrategyId};

/// Strategy-specific supporting data attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    PositionChange(PositionChangeEvidence),
    Spiderweb(SpiderwebEvidence),
    RetailReversal(RetailReversalEvidence),
    None,
}

/// One strategy's directional verdict for one variety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub variety: String,
    pub strategy: StrategyId,
    pub direction: Direction,
    /// In [0, 1]; always 0 for a neutral signal.
    pub strength: f64,
    /// Short human-readable summary.
    pub reason: String,
    pub evidence: Evidence,
}

impl Signal {
    /// Build a signal, clamping strength into [0, 1] and forcing it to 0 when
    /// the direction is neutral.
    pub fn new(
        variety: impl Into<String>,
        strategy: StrategyId,
        direction: Direction,
        strength: f64,
        reason: impl Into<String>,
        evidence: Evidence,
    ) -> Self {
        let strength = if direction.is_neutral() || !strength.is_finite() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        Self {
            variety: variety.into(),
            strategy,
            direction,
            strength,
            reason: reason.into(),
            evidence,
        }
    }

    pub fn neutral(
        variety: impl Into<String>,
        strategy: StrategyId,
        reason: impl Into<String>,
        evidence: Evidence,
    ) -> Self {
        Self::new(variety, strategy, Direction::Neutral, 0.0, reason, evidence)
    }

    /// Strength within [0, 1] and zero when neutral.
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.strength)
            && (!self.direction.is_neutral() || self.strength == 0.0)
    }
}

/// `numerator / denominator` capped at 1, or 0 when there is nothing to
/// normalise against.
pub(crate) fn capped_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    (numerator / denominator).min(1.0)
}
