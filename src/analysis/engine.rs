// =============================================================================
// Analysis Engine — provider → strategies → resonance → cached result
// =============================================================================
//
// One `analyze` call covers every variety the provider lists for the date:
//
//   1. list varieties              (failure => NoTradingData, nothing cached)
//   2. per variety, in parallel:   snapshot → 3 strategies, contracts → curve
//   3. join, then resonance, boards and statistics over all signals
//
// A variety whose data is unavailable is left out with a warning; it never
// aborts the run.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::{
    AnalysisCache, AnalysisResult, AnalysisStatistics, CacheKey, CacheStats, Clock, SystemClock,
    VarietyAnalysis,
};
use crate::error::AnalysisError;
use crate::futures_intel::{PositionChangeStrategy, RetailSeatReversalStrategy, SpiderwebStrategy};
use crate::market_data::PositionProvider;
use crate::retail_seats::RetailSeatConfig;
use crate::signals::{ResonanceDetector, Signal, StrategyBoard};
use crate::term_structure::{TermStructureAnalyzer, TermStructureResult};
use crate::types::StrategyId;

/// Tunables the engine is built with.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub display_limit: usize,
    pub informed_seat_count: usize,
    pub msd_threshold: f64,
    pub msd_full_strength: f64,
    pub cache_ttl: Duration,
    /// Evaluate varieties on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            display_limit: 20,
            informed_seat_count: 20,
            msd_threshold: 0.05,
            msd_full_strength: 0.10,
            cache_ttl: Duration::seconds(3600),
            parallel: true,
        }
    }
}

/// Everything produced for one variety before the cross-variety join.
#[derive(Default)]
struct VarietyOutcome {
    analysis: Option<VarietyAnalysis>,
    term_structure: Option<TermStructureResult>,
    warnings: Vec<String>,
}

pub struct AnalysisEngine {
    provider: Arc<dyn PositionProvider>,
    position_change: PositionChangeStrategy,
    spiderweb: SpiderwebStrategy,
    resonance: ResonanceDetector,
    cache: AnalysisCache,
    clock: Arc<dyn Clock>,
    parallel: bool,
}

impl AnalysisEngine {
    pub fn new(provider: Arc<dyn PositionProvider>, settings: EngineSettings) -> Self {
        Self::with_clock(provider, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn PositionProvider>,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            position_change: PositionChangeStrategy::new(settings.display_limit),
            spiderweb: SpiderwebStrategy::new(
                settings.informed_seat_count,
                settings.msd_threshold,
                settings.msd_full_strength,
            ),
            resonance: ResonanceDetector::default(),
            cache: AnalysisCache::new(settings.cache_ttl, Arc::clone(&clock)),
            clock,
            parallel: settings.parallel,
        }
    }

    /// Full analysis for `date` under `config`, served from cache when a
    /// fresh result for the same (date, config version) exists.
    pub fn analyze(
        &self,
        date: NaiveDate,
        config: &RetailSeatConfig,
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let key = CacheKey {
            date,
            config_version: config.version,
        };
        self.cache
            .get_or_compute(key, || self.compute(date, config).map(Arc::new))
    }

    pub fn invalidate_cache(&self) {
        self.cache.clear();
        info!("analysis cache invalidated");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn compute(
        &self,
        date: NaiveDate,
        config: &RetailSeatConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let varieties = self
            .provider
            .varieties(date)
            .map_err(|e| AnalysisError::NoTradingData {
                date,
                reason: e.to_string(),
            })?;

        let evaluate = |variety: &String| self.evaluate_variety(date, variety, config);
        let outcomes: Vec<VarietyOutcome> = if self.parallel {
            varieties.par_iter().map(evaluate).collect()
        } else {
            varieties.iter().map(evaluate).collect()
        };

        let mut analyses = Vec::with_capacity(outcomes.len());
        let mut term_structure = Vec::new();
        let mut warnings = Vec::new();
        for outcome in outcomes {
            analyses.extend(outcome.analysis);
            term_structure.extend(outcome.term_structure);
            warnings.extend(outcome.warnings);
        }

        let signals: Vec<Signal> = analyses
            .iter()
            .flat_map(|v| v.signals.iter().cloned())
            .collect();
        let resonance = self.resonance.detect(&signals);
        let boards = StrategyId::ALL
            .iter()
            .map(|&id| StrategyBoard::build(id, &signals))
            .collect();
        let statistics = AnalysisStatistics::collect(&analyses, &term_structure, &resonance);

        info!(
            %date,
            version = config.version,
            varieties = statistics.varieties,
            bullish = statistics.bullish_signals,
            bearish = statistics.bearish_signals,
            resonance = statistics.resonance_bullish + statistics.resonance_bearish,
            skipped = warnings.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            config_version: config.version,
            retail_seats: config.seats.iter().cloned().collect(),
            varieties: analyses,
            boards,
            term_structure,
            resonance,
            statistics,
            warnings,
            computed_at: self.clock.now(),
        })
    }

    fn evaluate_variety(
        &self,
        date: NaiveDate,
        variety: &str,
        config: &RetailSeatConfig,
    ) -> VarietyOutcome {
        let mut outcome = VarietyOutcome::default();

        match self.provider.snapshot(date, variety) {
            Ok(snapshot) => {
                let signals = vec![
                    self.position_change.evaluate(&snapshot),
                    self.spiderweb.evaluate(&snapshot),
                    RetailSeatReversalStrategy::evaluate(&snapshot, config),
                ];
                debug!(variety, seats = snapshot.seats.len(), "variety evaluated");
                outcome.analysis = Some(VarietyAnalysis {
                    variety: variety.to_string(),
                    seat_count: snapshot.seats.len(),
                    total_long: snapshot.total_long,
                    total_short: snapshot.total_short,
                    signals,
                });
            }
            Err(e) => {
                warn!(variety, error = %e, "skipping variety positions");
                outcome.warnings.push(e.to_string());
            }
        }

        match self.provider.contracts(date, variety) {
            Ok(contracts) => {
                outcome.term_structure = TermStructureAnalyzer::analyze_variety(variety, &contracts);
            }
            Err(e) => {
                warn!(variety, error = %e, "skipping variety term structure");
                outcome.warnings.push(e.to_string());
            }
        }

        outcome
    }
}
