// =============================================================================
// Shared types used across the seat intelligence engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Directional verdict of a single strategy for one variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Neutral
    }
}

impl Direction {
    pub fn is_neutral(self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Identifies which strategy produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    PositionChange,
    Spiderweb,
    RetailReversal,
}

impl StrategyId {
    /// Every strategy the engine runs, in reporting order.
    pub const ALL: [StrategyId; 3] = [
        StrategyId::PositionChange,
        StrategyId::Spiderweb,
        StrategyId::RetailReversal,
    ];
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionChange => write!(f, "PositionChange"),
            Self::Spiderweb => write!(f, "Spiderweb"),
            Self::RetailReversal => write!(f, "RetailReversal"),
        }
    }
}

/// Near-to-far price shape of a variety's contract curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStructure {
    /// Strictly decreasing from near to far.
    Back,
    /// Strictly increasing from near to far.
    Contango,
    Flat,
}

impl std::fmt::Display for TermStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Back => write!(f, "Back"),
            Self::Contango => write!(f, "Contango"),
            Self::Flat => write!(f, "Flat"),
        }
    }
}
