use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// One point of a series rebased so that its first value is 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebasedPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Relative performance of the tracked fund (A) against a comparison asset (B).
///
/// Each series is rebased to its *own* first point. When the two series start
/// on different dates `common_start` is false and the caller should say so
/// next to any chart built from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Display label of the comparison asset (e.g., "S&P 500")
    pub label: String,

    /// Ticker of the comparison asset
    pub ticker: String,

    pub rebased_series_a: Vec<RebasedPoint>,
    pub rebased_series_b: Vec<RebasedPoint>,

    /// True when both rebased series start on the same date
    pub common_start: bool,

    /// share_count × anchor_A × fx
    pub initial_investment_home: Metric,

    /// Value today had the initial investment gone into B instead
    pub counterfactual_value_home: Metric,

    /// counterfactual_value_home − initial_investment_home
    pub counterfactual_profit_home: Metric,
}
