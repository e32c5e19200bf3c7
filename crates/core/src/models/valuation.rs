use serde::{Deserialize, Serialize};

use super::metric::Metric;
use super::price::PriceLookup;

/// Derived figures for the tracked fund position. Recomputed per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Number of fund shares held
    pub share_count: u32,

    /// Cost-basis price at/after the purchase date (asset currency)
    pub anchor: PriceLookup,

    /// Most recent closing price (asset currency)
    pub latest: PriceLookup,

    /// FX rate used for all home-currency figures, if one was available
    pub fx_rate: Option<f64>,

    /// share_count × latest × fx
    pub holding_value_home: Metric,

    /// (latest − anchor) × share_count × fx
    pub profit_home: Metric,

    /// (latest / anchor − 1) × 100
    pub profit_percent: Metric,

    /// Sample standard deviation of daily returns × 100
    pub volatility_percent: Metric,

    /// (mean daily return − rf/252) / stddev of daily returns
    pub sharpe_ratio: Metric,
}
