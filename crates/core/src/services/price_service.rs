use chrono::NaiveDate;
use log::{info, warn};
use std::future::Future;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::{FxPair, FxRate, PriceSeries};
use crate::models::settings::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::providers::registry::MarketDataRegistry;
use crate::providers::traits::DataKind;

/// Fetches price history and FX rates from the provider registry.
///
/// Every call goes to the network; there is no cache between evaluations.
/// Each provider attempt is bounded by `timeout` and a failing provider
/// falls through to the next one registered for the same `DataKind`.
pub struct PriceService {
    registry: MarketDataRegistry,
    timeout: Duration,
}

impl PriceService {
    pub fn new(registry: MarketDataRegistry) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(registry: MarketDataRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Daily closes for `symbol` since `start`.
    ///
    /// An empty series counts as a failure so the next provider gets a turn.
    pub async fn fetch_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<PriceSeries, CoreError> {
        let providers = self.registry.get_providers_for(DataKind::PriceHistory);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(DataKind::PriceHistory.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match self.bounded(provider.fetch_price_history(symbol, start)).await {
                Ok(series) if !series.is_empty() => {
                    info!(
                        "{}: fetched {} prices for {symbol} since {start}",
                        provider.name(),
                        series.len()
                    );
                    return Ok(series);
                }
                Ok(_) => {
                    warn!("{}: empty price history for {symbol} since {start}", provider.name());
                    last_error = Some(CoreError::PriceDataUnavailable {
                        symbol: symbol.to_string(),
                        reason: format!("no quotes since {start}"),
                    });
                }
                Err(e) => {
                    warn!("{}: price history for {symbol} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(DataKind::PriceHistory.to_string())))
    }

    /// Latest FX rate for `pair`, validated finite and positive.
    pub async fn fetch_latest_fx_rate(&self, pair: &FxPair) -> Result<FxRate, CoreError> {
        if pair.is_identity() {
            return Ok(FxRate::identity(&pair.base));
        }

        let providers = self.registry.get_providers_for(DataKind::FxRate);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(DataKind::FxRate.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            let result = self
                .bounded(provider.fetch_latest_fx_rate(pair))
                .await
                .and_then(|rate| {
                    FxRate::new(pair.clone(), rate).map_err(|e| CoreError::Api {
                        provider: provider.name().to_string(),
                        message: e.to_string(),
                    })
                });
            match result {
                Ok(rate) => {
                    info!("{}: {pair} = {}", provider.name(), rate.rate);
                    return Ok(rate);
                }
                Err(e) => {
                    warn!("{}: FX rate for {pair} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(DataKind::FxRate.to_string())))
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| CoreError::Timeout(self.timeout.as_secs()))?
    }
}
