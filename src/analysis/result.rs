// =============================================================================
// Analysis Result — the immutable, serialisable output of one run
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::signals::{ResonanceReport, Signal, StrategyBoard};
use crate::term_structure::TermStructureResult;
use crate::types::{Direction, StrategyId, TermStructure};

/// Every strategy's signal for one variety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarietyAnalysis {
    pub variety: String,
    pub seat_count: usize,
    pub total_long: u64,
    pub total_short: u64,
    /// One signal per strategy, in `StrategyId::ALL` order.
    pub signals: Vec<Signal>,
}

#[cfg(test)]
impl VarietyAnalysis {
    pub fn signal(&self, strategy: StrategyId) -> Option<&Signal> {
        self.signals.iter().find(|s| s.strategy == strategy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub varieties: usize,
    pub bullish_signals: usize,
    pub bearish_signals: usize,
    pub resonance_bullish: usize,
    pub resonance_bearish: usize,
    pub back: usize,
    pub contango: usize,
    pub flat: usize,
}

impl AnalysisStatistics {
    pub fn collect(
        varieties: &[VarietyAnalysis],
        term_structure: &[TermStructureResult],
        resonance: &ResonanceReport,
    ) -> Self {
        let signals = varieties.iter().flat_map(|v| v.signals.iter());
        let mut stats = Self {
            varieties: varieties.len(),
            resonance_bullish: resonance.bullish.len(),
            resonance_bearish: resonance.bearish.len(),
            ..Self::default()
        };
        for s in signals {
            match s.direction {
                Direction::Bullish => stats.bullish_signals += 1,
                Direction::Bearish => stats.bearish_signals += 1,
                Direction::Neutral => {}
            }
        }
        for t in term_structure {
            match t.structure {
                TermStructure::Back => stats.back += 1,
                TermStructure::Contango => stats.contango += 1,
                TermStructure::Flat => stats.flat += 1,
            }
        }
        stats
    }
}

/// Full analysis for one trading date under one retail seat config version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub date: NaiveDate,
    pub config_version: u64,
    /// Retail seats the run was configured with.
    pub retail_seats: Vec<String>,
    pub varieties: Vec<VarietyAnalysis>,
    pub boards: Vec<StrategyBoard>,
    pub term_structure: Vec<TermStructureResult>,
    pub resonance: ResonanceReport,
    pub statistics: AnalysisStatistics,
    /// Varieties left out because their data was unavailable.
    pub warnings: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
impl AnalysisResult {
    pub fn variety(&self, variety: &str) -> Option<&VarietyAnalysis> {
        self.varieties.iter().find(|v| v.variety == variety)
    }

    pub fn term_structure(&self, variety: &str) -> Option<&TermStructureResult> {
        self.term_structure.iter().find(|t| t.variety == variety)
    }
}

impl AnalysisResult {
    /// Structural sanity check applied before a cached copy is served.
    pub fn is_well_formed(&self, date: NaiveDate, config_version: u64) -> bool {
        self.date == date
            && self.config_version == config_version
            && self
                .varieties
                .iter()
                .all(|v| v.signals.len() == StrategyId::ALL.len()
                    && v.signals.iter().all(Signal::is_well_formed))
            && self.term_structure.iter().all(|t| t.curve.len() >= 2)
            && self
                .resonance
                .bullish
                .iter()
                .chain(self.resonance.bearish.iter())
                .all(|r| r.strength > 0.0 && r.strength <= 1.0)
    }
}
