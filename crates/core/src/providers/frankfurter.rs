use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::{FxPair, PriceSeries};
use super::traits::{DataKind, MarketDataProvider};

const BASE_URL: &str = "https://api.frankfurter.dev/v1";

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) reference rates, published
///   once per working day, so the "latest" rate can lag Yahoo's by a day.
///
/// Serves FX only; used as the fallback when Yahoo has no quote.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at another Frankfurter-compatible host.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_url(&self, pair: &FxPair) -> String {
        format!("{}/latest?base={}&symbols={}", self.base_url, pair.base, pair.quote)
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl MarketDataProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    fn supported_data(&self) -> Vec<DataKind> {
        vec![DataKind::FxRate]
    }

    async fn fetch_price_history(
        &self,
        symbol: &str,
        _start: NaiveDate,
    ) -> Result<PriceSeries, CoreError> {
        Err(CoreError::Api {
            provider: "Frankfurter".into(),
            message: format!("Price history is not served (requested {symbol})"),
        })
    }

    async fn fetch_latest_fx_rate(&self, pair: &FxPair) -> Result<f64, CoreError> {
        // Same currency → rate is 1.0
        if pair.is_identity() {
            return Ok(1.0);
        }

        let resp: RatesResponse = self
            .client
            .get(self.latest_url(pair))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("Failed to parse response for {pair}: {e}"),
            })?;

        resp.rates.get(&pair.quote).copied().ok_or_else(|| CoreError::Api {
            provider: "Frankfurter".into(),
            message: format!("No rate found for {} → {}", pair.base, pair.quote),
        })
    }
}
