// =============================================================================
// Term Structure Analyzer — strict near-to-far curve classification
// =============================================================================
//
// Contracts of one variety are ordered by numeric expiry (never by symbol
// string) and the price curve is classified strictly:
//
//   every step down  =>  back      (near month richer)
//   every step up    =>  contango  (far months richer)
//   anything else    =>  flat      (a single tie or inversion is enough)
//
// Varieties with fewer than two priced contracts are skipped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::Contract;
use crate::types::TermStructure;

/// One contract on the curve, near month first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub symbol: String,
    pub expiry_yymm: u32,
    pub price: f64,
}

/// Price step between two consecutive contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDelta {
    pub from: String,
    pub to: String,
    /// `price[i+1] - price[i]`.
    pub delta: f64,
    /// `delta / price[i]`.
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermStructureResult {
    pub variety: String,
    pub structure: TermStructure,
    pub curve: Vec<CurvePoint>,
    pub deltas: Vec<PriceDelta>,
    /// Far-month price relative to near-month price, minus one.
    pub spread_pct: f64,
}

pub struct TermStructureAnalyzer;

impl TermStructureAnalyzer {
    /// Classify one variety's contracts, or `None` when fewer than two have a
    /// usable price.
    pub fn analyze_variety<'a>(
        variety: &str,
        contracts: impl IntoIterator<Item = &'a Contract>,
    ) -> Option<TermStructureResult> {
        let mut priced: Vec<&Contract> = contracts
            .into_iter()
            .filter(|c| c.has_valid_price())
            .collect();

        if priced.len() < 2 {
            debug!(variety, contracts = priced.len(), "insufficient contracts for curve");
            return None;
        }

        priced.sort_by_key(|c| c.month_key());

        let prices: Vec<f64> = priced.iter().map(|c| c.price).collect();
        let structure = classify(&prices);

        let deltas = priced
            .windows(2)
            .map(|pair| {
                let delta = pair[1].price - pair[0].price;
                PriceDelta {
                    from: pair[0].symbol.clone(),
                    to: pair[1].symbol.clone(),
                    delta,
                    pct: delta / pair[0].price,
                }
            })
            .collect();

        let near = prices[0];
        let far = prices[prices.len() - 1];

        Some(TermStructureResult {
            variety: variety.to_string(),
            structure,
            curve: priced
                .iter()
                .map(|c| CurvePoint {
                    symbol: c.symbol.clone(),
                    expiry_yymm: c.expiry_yymm,
                    price: c.price,
                })
                .collect(),
            deltas,
            spread_pct: far / near - 1.0,
        })
    }
}

/// Strict classification of a near-to-far price sequence.
pub fn classify(prices: &[f64]) -> TermStructure {
    if prices.len() < 2 {
        return TermStructure::Flat;
    }
    if prices.windows(2).all(|w| w[0] > w[1]) {
        TermStructure::Back
    } else if prices.windows(2).all(|w| w[0] < w[1]) {
        TermStructure::Contango
    } else {
        TermStructure::Flat
    }
}
