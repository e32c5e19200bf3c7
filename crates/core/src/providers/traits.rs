use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::{FxPair, PriceSeries};

/// The kinds of market data a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Daily closing prices of a fund or index
    PriceHistory,
    /// Latest exchange rate of a currency pair
    FxRate,
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::PriceHistory => write!(f, "PriceHistory"),
            DataKind::FxRate => write!(f, "FxRate"),
        }
    }
}

/// Read-only market-data boundary.
///
/// Each external API (Yahoo Finance, Frankfurter) implements this trait.
/// Callers must not assume either call succeeds.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which kinds of data this provider can serve.
    fn supported_data(&self) -> Vec<DataKind>;

    /// Daily closes of `symbol` from `start` up to today, in the symbol's
    /// trading currency.
    async fn fetch_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<PriceSeries, CoreError>;

    /// Latest quote-per-base rate for `pair`.
    async fn fetch_latest_fx_rate(&self, pair: &FxPair) -> Result<f64, CoreError>;
}
