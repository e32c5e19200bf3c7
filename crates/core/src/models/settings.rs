use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::CoreError;
use super::price::FxPair;

/// Annual risk-free rate used for the Sharpe ratio when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;

/// Default per-request deadline for provider and ledger fetches.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the deposit ledger lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerSource {
    /// Local CSV file; readable and appendable.
    File(PathBuf),
    /// Raw CSV over HTTP(S); read-only.
    Url(String),
}

impl LedgerSource {
    /// `http://` / `https://` → `Url`, anything else → `File`.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            LedgerSource::Url(trimmed.to_string())
        } else {
            LedgerSource::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for LedgerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerSource::File(path) => write!(f, "{}", path.display()),
            LedgerSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A second instrument to compare the tracked fund against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSettings {
    pub ticker: String,
    pub label: String,
}

/// Which optional derivations a report includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSelection {
    /// Volatility and Sharpe ratio
    pub risk_metrics: bool,
    /// Rebased comparison and counterfactual (needs `Settings::comparison`)
    pub comparison: bool,
    /// Raw price history for the trend chart
    pub price_history: bool,
}

impl Default for MetricSelection {
    fn default() -> Self {
        Self {
            risk_metrics: true,
            comparison: true,
            price_history: true,
        }
    }
}

/// The configuration surface the engine needs at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Shared dashboard password (plain text; hashed by `PasswordGate` at startup)
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Number of fund shares held
    pub share_count: u32,

    /// Fund ISIN, display only
    pub isin: String,

    /// Market-data ticker of the fund (e.g., "VT")
    pub ticker: String,

    /// Purchase date; the anchor price is looked up from here
    pub start_date: NaiveDate,

    /// First day of price history to fetch; defaults to `start_date`
    #[serde(default)]
    pub history_start: Option<NaiveDate>,

    /// Cash balance before any ledger deposits
    pub initial_savings: Decimal,

    /// Fund trading currency → home currency
    pub fx_pair: FxPair,

    pub ledger_source: LedgerSource,

    /// Annual risk-free rate as a fraction (0.01 = 1%)
    pub risk_free_rate_annual: f64,

    /// Deadline for each remote fetch
    pub fetch_timeout: Duration,

    /// Amount posted by the scheduled deposit job
    pub deposit_amount: Decimal,

    #[serde(default)]
    pub comparison: Option<ComparisonSettings>,

    #[serde(default)]
    pub metrics: MetricSelection,
}

// Hand-written so the password never lands in logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("password", &"<redacted>")
            .field("share_count", &self.share_count)
            .field("isin", &self.isin)
            .field("ticker", &self.ticker)
            .field("start_date", &self.start_date)
            .field("history_start", &self.history_start)
            .field("initial_savings", &self.initial_savings)
            .field("fx_pair", &self.fx_pair)
            .field("ledger_source", &self.ledger_source)
            .field("risk_free_rate_annual", &self.risk_free_rate_annual)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("deposit_amount", &self.deposit_amount)
            .field("comparison", &self.comparison)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Settings {
    /// Settings with defaults for everything except the required surface.
    pub fn new(
        password: impl Into<String>,
        share_count: u32,
        isin: impl Into<String>,
        ticker: impl Into<String>,
        start_date: NaiveDate,
        initial_savings: Decimal,
        ledger_source: LedgerSource,
    ) -> Self {
        Self {
            password: password.into(),
            share_count,
            isin: isin.into(),
            ticker: ticker.into().trim().to_uppercase(),
            start_date,
            history_start: None,
            initial_savings,
            fx_pair: FxPair::new("USD", "CHF"),
            ledger_source,
            risk_free_rate_annual: DEFAULT_RISK_FREE_RATE,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            deposit_amount: Decimal::from(20),
            comparison: None,
            metrics: MetricSelection::default(),
        }
    }

    /// Home currency code (the quote side of the FX pair).
    pub fn home_currency(&self) -> &str {
        &self.fx_pair.quote
    }

    /// Trading currency of the fund (the base side of the FX pair).
    pub fn asset_currency(&self) -> &str {
        &self.fx_pair.base
    }

    /// First day of price history to request.
    pub fn history_start(&self) -> NaiveDate {
        self.history_start.unwrap_or(self.start_date)
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.password.is_empty() {
            return Err(CoreError::InvalidConfig("password must not be empty".into()));
        }
        if self.ticker.trim().is_empty() {
            return Err(CoreError::InvalidConfig("ticker must not be empty".into()));
        }
        for code in [&self.fx_pair.base, &self.fx_pair.quote] {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::InvalidConfig(format!(
                    "Invalid currency code '{code}': must be exactly 3 ASCII letters (e.g., USD, CHF)"
                )));
            }
        }
        if !self.risk_free_rate_annual.is_finite() || self.risk_free_rate_annual < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "risk-free rate must be finite and non-negative, got {}",
                self.risk_free_rate_annual
            )));
        }
        if self.fetch_timeout.is_zero() {
            return Err(CoreError::InvalidConfig("fetch timeout must be positive".into()));
        }
        if self.history_start() > self.start_date {
            return Err(CoreError::InvalidConfig(format!(
                "history start {} is after the purchase date {}",
                self.history_start(),
                self.start_date
            )));
        }
        if let Some(cmp) = &self.comparison {
            if cmp.ticker.trim().is_empty() {
                return Err(CoreError::InvalidConfig("comparison ticker must not be empty".into()));
            }
        }
        Ok(())
    }
}
