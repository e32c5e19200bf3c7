pub mod auth;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use log::{debug, info};

use auth::{AuthContext, PasswordGate};
use errors::CoreError;
use models::{
    deposit::DepositEntry,
    price::{FxRate, PriceSeries},
    report::{DashboardReport, DataIssue, LedgerStatus},
    settings::Settings,
};
use providers::registry::MarketDataRegistry;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use services::{
    comparison_service::ComparisonService, ledger_service::LedgerService,
    price_service::PriceService, valuation_service::ValuationService,
};

/// Main entry point for the Fund Tracker core library.
///
/// One valuation engine for the cash ledger plus a single fund position.
/// Holds configuration and services only: every `evaluate` call fetches
/// fresh data and keeps nothing afterwards.
#[must_use]
pub struct FundTracker {
    settings: Settings,
    gate: PasswordGate,
    price_service: PriceService,
    ledger_service: LedgerService,
    valuation_service: ValuationService,
    comparison_service: ComparisonService,
}

impl std::fmt::Debug for FundTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundTracker")
            .field("settings", &self.settings)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl FundTracker {
    /// Build an engine backed by the default market-data providers.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        Self::with_registry(settings, MarketDataRegistry::new_with_defaults())
    }

    /// Build an engine backed by a custom provider registry.
    ///
    /// The plain password is hashed into the gate and then cleared from the
    /// stored settings.
    pub fn with_registry(
        mut settings: Settings,
        registry: MarketDataRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let gate = PasswordGate::new(&settings.password)?;
        settings.password.clear();

        let timeout = settings.fetch_timeout;
        info!(
            "Tracking {} share(s) of {} ({}) since {}",
            settings.share_count, settings.ticker, settings.isin, settings.start_date
        );

        Ok(Self {
            price_service: PriceService::with_timeout(registry, timeout),
            ledger_service: LedgerService::with_timeout(timeout),
            valuation_service: ValuationService::new(),
            comparison_service: ComparisonService::new(),
            settings,
            gate,
        })
    }

    /// Settings in effect (password cleared).
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Check a password attempt. A wrong password is the only way
    /// `AuthenticationFailed` is produced.
    pub fn authenticate(&self, candidate: &str) -> Result<AuthContext, CoreError> {
        self.gate.authenticate(candidate)
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Run one pull-compute pass as of `as_of`.
    ///
    /// Never fails: an unreadable ledger, missing prices or a missing FX
    /// rate end up in `DashboardReport::issues` and as undefined metrics.
    pub async fn evaluate(&self, auth: &AuthContext, as_of: NaiveDate) -> DashboardReport {
        debug!("Evaluating as of {as_of} (session since {})", auth.authenticated_at());
        let settings = &self.settings;
        let mut issues = Vec::new();

        // 1. Cash side
        let cash = self
            .ledger_service
            .load_balance(&settings.ledger_source, settings.initial_savings, as_of)
            .await;
        if let LedgerStatus::Unavailable { reason } = &cash.status {
            issues.push(DataIssue::LedgerUnavailable {
                reason: reason.clone(),
            });
        }

        // 2. Market data
        let series = self
            .fetch_series_or_empty(&settings.ticker, settings.history_start(), &mut issues)
            .await;
        let fx = self.fetch_fx_or_none(&mut issues).await;

        // 3. Fund side
        let valuation = self.valuation_service.evaluate(
            settings.share_count,
            &series,
            settings.start_date,
            fx.as_ref(),
            settings.risk_free_rate_annual,
            settings.metrics.risk_metrics,
        );
        if !series.is_empty() && !valuation.anchor.is_found() {
            issues.push(DataIssue::PriceDataUnavailable {
                symbol: settings.ticker.clone(),
                reason: format!("no price on or after {}", settings.start_date),
            });
        }

        // 4. Comparison
        let comparison = match (&settings.comparison, settings.metrics.comparison) {
            (Some(cmp), true) => {
                let series_b = self
                    .fetch_series_or_empty(&cmp.ticker, settings.history_start(), &mut issues)
                    .await;
                Some(self.comparison_service.compare(
                    &cmp.label,
                    &cmp.ticker,
                    &series,
                    &series_b,
                    settings.share_count,
                    settings.start_date,
                    fx.as_ref(),
                ))
            }
            _ => None,
        };

        // 5. Totals
        let holding = valuation.holding_value_home;
        let total_value_home = cash.balance.to_f64().unwrap_or(0.0) + holding.or_zero();

        DashboardReport {
            as_of_date: as_of,
            home_currency: settings.home_currency().to_string(),
            asset_currency: settings.asset_currency().to_string(),
            isin: settings.isin.clone(),
            ticker: settings.ticker.clone(),
            start_date: settings.start_date,
            cash,
            total_value_home,
            total_value_complete: holding.is_available(),
            valuation,
            comparison,
            price_history: if settings.metrics.price_history {
                series.points().to_vec()
            } else {
                Vec::new()
            },
            issues,
        }
    }

    // ── Deposits ────────────────────────────────────────────────────

    /// Append a deposit dated `date` to the ledger file.
    ///
    /// `amount` defaults to the configured fixed deposit amount.
    pub fn record_deposit(
        &self,
        date: NaiveDate,
        amount: Option<Decimal>,
    ) -> Result<DepositEntry, CoreError> {
        let entry = DepositEntry::new(date, amount.unwrap_or(self.settings.deposit_amount));
        self.ledger_service
            .append_deposit(&self.settings.ledger_source, &entry)?;
        Ok(entry)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn fetch_series_or_empty(
        &self,
        symbol: &str,
        start: NaiveDate,
        issues: &mut Vec<DataIssue>,
    ) -> PriceSeries {
        match self.price_service.fetch_price_history(symbol, start).await {
            Ok(series) => series,
            Err(e) => {
                issues.push(DataIssue::PriceDataUnavailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
                PriceSeries::empty()
            }
        }
    }

    async fn fetch_fx_or_none(&self, issues: &mut Vec<DataIssue>) -> Option<FxRate> {
        let pair = &self.settings.fx_pair;
        match self.price_service.fetch_latest_fx_rate(pair).await {
            Ok(rate) => Some(rate),
            Err(e) => {
                issues.push(DataIssue::FxRateUnavailable {
                    pair: pair.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
