use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use log::debug;
use time::OffsetDateTime;

use crate::errors::CoreError;
use crate::models::price::{FxPair, PricePoint, PriceSeries};
use super::traits::{DataKind, MarketDataProvider};

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance provider for fund prices and FX quotes.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global ETFs, equities, indices, and currency pairs.
/// - **FX**: pairs are quoted as `<BASE><QUOTE>=X` (e.g., `USDCHF=X`).
///
/// Prices come back in the instrument's native currency; conversion to the
/// home currency is done by `CurrencyService`.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }

    /// Yahoo ticker for a currency pair.
    pub fn fx_symbol(pair: &FxPair) -> String {
        format!("{}{}=X", pair.base, pair.quote)
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let invalid = |e: &dyn std::fmt::Display| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid date {date}: {e}"),
        };
        let month = time::Month::try_from(date.month() as u8).map_err(|e| invalid(&e))?;
        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| invalid(&e))?
            .midnight()
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_data(&self) -> Vec<DataKind> {
        vec![DataKind::PriceHistory, DataKind::FxRate]
    }

    async fn fetch_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<PriceSeries, CoreError> {
        let today = Utc::now().date_naive();
        let start_dt = Self::to_offset_datetime(start)?;
        // Inclusive of today's (possibly intraday) close
        let end_dt = Self::to_offset_datetime(today + chrono::Duration::days(1))?;

        let resp = self
            .connector
            .get_quote_history(symbol, start_dt, end_dt)
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch history for {symbol} since {start}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp as i64)?;
                (date >= start).then_some(PricePoint::new(date, q.close))
            })
            .collect();

        debug!("{PROVIDER}: {} quotes for {symbol} since {start}", points.len());
        Ok(PriceSeries::new(points))
    }

    async fn fetch_latest_fx_rate(&self, pair: &FxPair) -> Result<f64, CoreError> {
        if pair.is_identity() {
            return Ok(1.0);
        }

        let symbol = Self::fx_symbol(pair);
        let resp = self
            .connector
            .get_latest_quotes(&symbol, "1d")
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch latest quote for {symbol}: {e}"),
            })?;

        let quote = resp.last_quote().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {symbol}: {e}"),
        })?;

        Ok(quote.close)
    }
}
