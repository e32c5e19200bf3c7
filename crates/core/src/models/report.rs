use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::comparison::ComparisonResult;
use super::price::PricePoint;
use super::valuation::ValuationResult;

/// Whether the deposit ledger could be read for this evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// Ledger was read; `skipped_rows` malformed rows were ignored.
    Available { entries: usize, skipped_rows: usize },
    /// Ledger could not be fetched or parsed; the balance is the initial savings.
    Unavailable { reason: String },
}

/// Cash balance as of a date, plus how trustworthy it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    pub balance: Decimal,
    pub status: LedgerStatus,
}

impl LedgerBalance {
    pub fn is_available(&self) -> bool {
        matches!(self.status, LedgerStatus::Available { .. })
    }
}

/// A recoverable problem hit during an evaluation, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataIssue {
    LedgerUnavailable { reason: String },
    PriceDataUnavailable { symbol: String, reason: String },
    FxRateUnavailable { pair: String, reason: String },
}

impl std::fmt::Display for DataIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataIssue::LedgerUnavailable { reason } => {
                write!(f, "Could not load deposits ledger: {reason}")
            }
            DataIssue::PriceDataUnavailable { symbol, reason } => {
                write!(f, "No price data for {symbol}: {reason}")
            }
            DataIssue::FxRateUnavailable { pair, reason } => {
                write!(f, "No FX rate for {pair}: {reason}")
            }
        }
    }
}

/// Everything the presentation layer needs for one dashboard render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    /// Date this report was computed for
    pub as_of_date: NaiveDate,

    /// Currency of all `*_home` figures (e.g., "CHF")
    pub home_currency: String,

    /// Trading currency of the fund (e.g., "USD")
    pub asset_currency: String,

    pub isin: String,
    pub ticker: String,
    pub start_date: NaiveDate,

    /// Cash side of the portfolio
    pub cash: LedgerBalance,

    /// Fund side of the portfolio
    pub valuation: ValuationResult,

    /// cash + holding value; the holding counts as 0 when its value is undefined
    pub total_value_home: f64,

    /// False when `total_value_home` excludes an undefined holding value
    pub total_value_complete: bool,

    /// Present when a comparison asset is configured and selected
    pub comparison: Option<ComparisonResult>,

    /// Raw price history for the trend chart (empty when not selected)
    pub price_history: Vec<PricePoint>,

    pub issues: Vec<DataIssue>,
}
