// ═══════════════════════════════════════════════════════════════════
// Service Tests — PriceService fallback/timeout, FundTracker facade:
// auth, evaluation (happy and degraded paths), deposit recording
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fund_tracker_core::errors::CoreError;
use fund_tracker_core::models::metric::{Metric, UndefinedReason};
use fund_tracker_core::models::price::{FxPair, PricePoint, PriceSeries};
use fund_tracker_core::models::report::{DataIssue, LedgerStatus};
use fund_tracker_core::models::settings::{ComparisonSettings, LedgerSource, MetricSelection, Settings};
use fund_tracker_core::providers::registry::MarketDataRegistry;
use fund_tracker_core::providers::traits::{DataKind, MarketDataProvider};
use fund_tracker_core::services::price_service::PriceService;
use fund_tracker_core::FundTracker;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — Mock Providers
// ═══════════════════════════════════════════════════════════════════

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn p(y: i32, m: u32, day: u32, price: f64) -> PricePoint {
    PricePoint::new(d(y, m, day), price)
}

/// Serves canned history per symbol and a fixed FX rate.
struct MockMarketData {
    name: String,
    history: HashMap<String, Vec<PricePoint>>,
    fx_rate: Option<f64>,
}

impl MockMarketData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            history: HashMap::new(),
            fx_rate: None,
        }
    }

    fn with_history(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.history.insert(symbol.to_string(), points);
        self
    }

    fn with_fx(mut self, rate: f64) -> Self {
        self.fx_rate = Some(rate);
        self
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_data(&self) -> Vec<DataKind> {
        vec![DataKind::PriceHistory, DataKind::FxRate]
    }

    async fn fetch_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<PriceSeries, CoreError> {
        let points = self
            .history
            .get(symbol)
            .ok_or_else(|| CoreError::PriceDataUnavailable {
                symbol: symbol.to_string(),
                reason: "unknown symbol".into(),
            })?;
        Ok(PriceSeries::new(
            points.iter().copied().filter(|pt| pt.date >= start).collect(),
        ))
    }

    async fn fetch_latest_fx_rate(&self, pair: &FxPair) -> Result<f64, CoreError> {
        self.fx_rate.ok_or_else(|| CoreError::Api {
            provider: self.name.clone(),
            message: format!("no rate for {pair}"),
        })
    }
}

/// Fails every request, like an unreachable host.
struct FailingProvider;

#[async_trait]
impl MarketDataProvider for FailingProvider {
    fn name(&self) -> &str {
        "Failing"
    }

    fn supported_data(&self) -> Vec<DataKind> {
        vec![DataKind::PriceHistory, DataKind::FxRate]
    }

    async fn fetch_price_history(&self, _: &str, _: NaiveDate) -> Result<PriceSeries, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }

    async fn fetch_latest_fx_rate(&self, _: &FxPair) -> Result<f64, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }
}

/// Never answers within any reasonable deadline.
struct SlowProvider;

#[async_trait]
impl MarketDataProvider for SlowProvider {
    fn name(&self) -> &str {
        "Slow"
    }

    fn supported_data(&self) -> Vec<DataKind> {
        vec![DataKind::PriceHistory, DataKind::FxRate]
    }

    async fn fetch_price_history(&self, _: &str, _: NaiveDate) -> Result<PriceSeries, CoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(PriceSeries::empty())
    }

    async fn fetch_latest_fx_rate(&self, _: &FxPair) -> Result<f64, CoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(1.0)
    }
}

fn registry(providers: Vec<Box<dyn MarketDataProvider>>) -> MarketDataRegistry {
    let mut registry = MarketDataRegistry::new();
    for provider in providers {
        registry.register(provider);
    }
    registry
}

fn fund_history() -> Vec<PricePoint> {
    vec![
        p(2024, 1, 2, 100.0),
        p(2024, 1, 3, 102.0),
        p(2024, 1, 4, 101.0),
        p(2024, 1, 5, 110.0),
    ]
}

fn benchmark_history() -> Vec<PricePoint> {
    vec![
        p(2024, 1, 2, 5000.0),
        p(2024, 1, 3, 5100.0),
        p(2024, 1, 4, 5200.0),
        p(2024, 1, 5, 5500.0),
    ]
}

fn healthy_market() -> MockMarketData {
    MockMarketData::new("Mock")
        .with_history("VT", fund_history())
        .with_history("SPY", benchmark_history())
        .with_fx(0.9)
}

fn write_ledger(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("deposit.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn settings(ledger: PathBuf) -> Settings {
    let mut s = Settings::new(
        "correct horse",
        10,
        "IE00B3RBWM25",
        "VT",
        d(2024, 1, 2),
        dec!(1000),
        LedgerSource::File(ledger),
    );
    s.fetch_timeout = Duration::from_secs(5);
    s.comparison = Some(ComparisonSettings {
        ticker: "SPY".into(),
        label: "S&P 500".into(),
    });
    s
}

fn approx(metric: Metric, expected: f64) {
    match metric {
        Metric::Available(v) => assert!(
            (v - expected).abs() < 1e-9,
            "expected {expected}, got {v}"
        ),
        Metric::Undefined(reason) => panic!("expected {expected}, got undefined ({reason})"),
    }
}

// ═══════════════════════════════════════════════════════════════════
// PriceService
// ═══════════════════════════════════════════════════════════════════

mod price_service {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_next_provider() {
        let svc = PriceService::new(registry(vec![
            Box::new(FailingProvider),
            Box::new(healthy_market()),
        ]));

        let series = svc.fetch_price_history("VT", d(2024, 1, 1)).await.unwrap();
        assert_eq!(series.len(), 4);

        let rate = svc.fetch_latest_fx_rate(&FxPair::new("USD", "CHF")).await.unwrap();
        assert_eq!(rate.rate, 0.9);
    }

    #[tokio::test]
    async fn empty_history_counts_as_failure() {
        let svc = PriceService::new(registry(vec![Box::new(healthy_market())]));
        let err = svc.fetch_price_history("VT", d(2030, 1, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::PriceDataUnavailable { .. }));
    }

    #[tokio::test]
    async fn last_error_is_reported() {
        let svc = PriceService::new(registry(vec![Box::new(FailingProvider)]));
        let err = svc.fetch_price_history("VT", d(2024, 1, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }

    #[tokio::test]
    async fn no_provider() {
        let svc = PriceService::new(MarketDataRegistry::new());
        assert!(matches!(
            svc.fetch_price_history("VT", d(2024, 1, 1)).await,
            Err(CoreError::NoProvider(_))
        ));
        assert!(matches!(
            svc.fetch_latest_fx_rate(&FxPair::new("USD", "CHF")).await,
            Err(CoreError::NoProvider(_))
        ));
    }

    #[tokio::test]
    async fn identity_pair_needs_no_provider() {
        let svc = PriceService::new(MarketDataRegistry::new());
        let rate = svc.fetch_latest_fx_rate(&FxPair::new("CHF", "CHF")).await.unwrap();
        assert_eq!(rate.rate, 1.0);
    }

    #[tokio::test]
    async fn non_positive_rate_is_rejected() {
        let svc = PriceService::new(registry(vec![Box::new(MockMarketData::new("Zero").with_fx(0.0))]));
        let err = svc.fetch_latest_fx_rate(&FxPair::new("USD", "CHF")).await.unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let svc = PriceService::with_timeout(
            registry(vec![Box::new(SlowProvider)]),
            Duration::from_millis(50),
        );
        let err = svc.fetch_price_history("VT", d(2024, 1, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn slow_provider_is_skipped_for_next() {
        let svc = PriceService::with_timeout(
            registry(vec![Box::new(SlowProvider), Box::new(healthy_market())]),
            Duration::from_millis(50),
        );
        let rate = svc.fetch_latest_fx_rate(&FxPair::new("USD", "CHF")).await.unwrap();
        assert_eq!(rate.rate, 0.9);
    }

    #[tokio::test]
    async fn first_healthy_provider_in_registration_order_wins() {
        let svc = PriceService::new(registry(vec![
            Box::new(FailingProvider),
            Box::new(MockMarketData::new("Primary").with_fx(0.9)),
            Box::new(MockMarketData::new("Secondary").with_fx(0.8)),
        ]));
        let rate = svc.fetch_latest_fx_rate(&FxPair::new("USD", "CHF")).await.unwrap();
        assert_eq!(rate.rate, 0.9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// FundTracker — construction and auth
// ═══════════════════════════════════════════════════════════════════

mod facade_auth {
    use super::*;

    #[test]
    fn rejects_empty_password() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path().join("deposit.csv"));
        s.password = String::new();
        let err = FundTracker::with_registry(s, MarketDataRegistry::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path().join("deposit.csv"));
        s.history_start = Some(d(2024, 6, 1));
        assert!(FundTracker::with_registry(s, MarketDataRegistry::new()).is_err());
    }

    #[test]
    fn correct_password_grants_access() {
        let dir = tempfile::tempdir().unwrap();
        let tracker =
            FundTracker::with_registry(settings(dir.path().join("deposit.csv")), MarketDataRegistry::new())
                .unwrap();
        assert!(tracker.authenticate("correct horse").is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tracker =
            FundTracker::with_registry(settings(dir.path().join("deposit.csv")), MarketDataRegistry::new())
                .unwrap();
        for attempt in ["", "correct horse ", "Correct horse", "wrong"] {
            assert!(matches!(
                tracker.authenticate(attempt),
                Err(CoreError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn plain_password_is_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let tracker =
            FundTracker::with_registry(settings(dir.path().join("deposit.csv")), MarketDataRegistry::new())
                .unwrap();
        assert!(tracker.settings().password.is_empty());
        assert!(!format!("{tracker:?}").contains("correct horse"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// FundTracker — evaluate
// ═══════════════════════════════════════════════════════════════════

mod facade_evaluate {
    use super::*;

    #[tokio::test]
    async fn full_report() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n01.01.2024,100\n01.02.2024,50\n");
        let tracker =
            FundTracker::with_registry(settings(ledger), registry(vec![Box::new(healthy_market())]))
                .unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;

        assert!(report.issues.is_empty(), "issues: {:?}", report.issues);
        assert_eq!(report.home_currency, "CHF");
        assert_eq!(report.asset_currency, "USD");
        assert_eq!(report.cash.balance, dec!(1100));
        assert_eq!(
            report.cash.status,
            LedgerStatus::Available {
                entries: 2,
                skipped_rows: 0
            }
        );

        let v = &report.valuation;
        assert_eq!(v.anchor.price(), Some(100.0));
        assert_eq!(v.latest.price(), Some(110.0));
        approx(v.holding_value_home, 990.0);
        approx(v.profit_home, 90.0);
        approx(v.profit_percent, 10.0);
        assert!(v.volatility_percent.is_available());
        assert!(v.sharpe_ratio.is_available());

        assert!((report.total_value_home - 2090.0).abs() < 1e-9);
        assert!(report.total_value_complete);
        assert_eq!(report.price_history.len(), 4);

        let cmp = report.comparison.expect("comparison requested");
        assert_eq!(cmp.ticker, "SPY");
        assert!(cmp.common_start);
        approx(cmp.initial_investment_home, 900.0);
        // 900 CHF buys 900 / 5000 units of SPY, worth 0.18 × 5500 × 0.9
        approx(cmp.counterfactual_value_home, 891.0);
        approx(cmp.counterfactual_profit_home, -9.0);
    }

    #[tokio::test]
    async fn market_data_down_degrades_to_cash_only() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n01.01.2024,100\n");
        let mut s = settings(ledger);
        s.comparison = None;
        let tracker = FundTracker::with_registry(s, registry(vec![Box::new(FailingProvider)])).unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;

        assert_eq!(report.cash.balance, dec!(1100));
        assert_eq!(
            report.valuation.holding_value_home,
            Metric::Undefined(UndefinedReason::MissingPrice)
        );
        assert!((report.total_value_home - 1100.0).abs() < 1e-9);
        assert!(!report.total_value_complete);
        assert!(report.price_history.is_empty());
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, DataIssue::PriceDataUnavailable { symbol, .. } if symbol == "VT")));
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, DataIssue::FxRateUnavailable { pair, .. } if pair == "USD/CHF")));
    }

    #[tokio::test]
    async fn missing_fx_keeps_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n");
        let market = MockMarketData::new("NoFx").with_history("VT", fund_history());
        let mut s = settings(ledger);
        s.comparison = None;
        let tracker = FundTracker::with_registry(s, registry(vec![Box::new(market)])).unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;

        assert_eq!(
            report.valuation.holding_value_home,
            Metric::Undefined(UndefinedReason::MissingFxRate)
        );
        approx(report.valuation.profit_percent, 10.0);
        assert_eq!(report.issues.len(), 1);
        assert!(matches!(report.issues[0], DataIssue::FxRateUnavailable { .. }));
    }

    #[tokio::test]
    async fn missing_ledger_uses_initial_savings() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = FundTracker::with_registry(
            settings(dir.path().join("missing.csv")),
            registry(vec![Box::new(healthy_market())]),
        )
        .unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;

        assert_eq!(report.cash.balance, dec!(1000));
        assert!(!report.cash.is_available());
        assert!(matches!(report.issues.as_slice(), [DataIssue::LedgerUnavailable { .. }]));
        assert!(report.valuation.holding_value_home.is_available());
    }

    #[tokio::test]
    async fn purchase_date_after_last_quote_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n");
        let mut s = settings(ledger);
        s.start_date = d(2024, 2, 1);
        s.history_start = Some(d(2024, 1, 1));
        s.comparison = None;
        let tracker = FundTracker::with_registry(s, registry(vec![Box::new(healthy_market())])).unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 2, 15)).await;

        assert!(!report.valuation.anchor.is_found());
        approx(report.valuation.holding_value_home, 990.0);
        assert!(!report.valuation.profit_home.is_available());
        assert!(matches!(
            report.issues.as_slice(),
            [DataIssue::PriceDataUnavailable { .. }]
        ));
    }

    #[tokio::test]
    async fn optional_metrics_can_be_switched_off() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n");
        let mut s = settings(ledger);
        s.metrics = MetricSelection {
            risk_metrics: false,
            comparison: false,
            price_history: false,
        };
        let tracker = FundTracker::with_registry(s, registry(vec![Box::new(healthy_market())])).unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;

        assert!(report.comparison.is_none());
        assert!(report.price_history.is_empty());
        assert_eq!(
            report.valuation.sharpe_ratio,
            Metric::Undefined(UndefinedReason::NotRequested)
        );
        approx(report.valuation.holding_value_home, 990.0);
    }

    #[tokio::test]
    async fn report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n01.01.2024,100\n");
        let tracker =
            FundTracker::with_registry(settings(ledger), registry(vec![Box::new(healthy_market())]))
                .unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let report = tracker.evaluate(&auth, d(2024, 1, 15)).await;
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["home_currency"], "CHF");
        assert!(json["valuation"]["holding_value_home"].is_object());
    }
}

// ═══════════════════════════════════════════════════════════════════
// FundTracker — record_deposit
// ═══════════════════════════════════════════════════════════════════

mod facade_deposit {
    use super::*;

    #[tokio::test]
    async fn recorded_deposit_shows_up_in_balance() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path(), "date,amount\n01.01.2024,100\n");
        let tracker =
            FundTracker::with_registry(settings(ledger.clone()), registry(vec![Box::new(healthy_market())]))
                .unwrap();
        let auth = tracker.authenticate("correct horse").unwrap();

        let before = tracker.evaluate(&auth, d(2024, 1, 15)).await.cash.balance;
        let entry = tracker.record_deposit(d(2024, 1, 10), None).unwrap();
        let after = tracker.evaluate(&auth, d(2024, 1, 15)).await.cash.balance;

        assert_eq!(entry.amount, dec!(20));
        assert_eq!(after - before, dec!(20));
        assert!(std::fs::read_to_string(&ledger).unwrap().ends_with("10.01.2024,20\n"));
    }

    #[test]
    fn explicit_amount_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("deposit.csv");
        let tracker =
            FundTracker::with_registry(settings(ledger.clone()), MarketDataRegistry::new()).unwrap();

        let entry = tracker.record_deposit(d(2024, 3, 1), Some(dec!(-5))).unwrap();

        assert_eq!(entry.amount, dec!(-5));
        assert_eq!(
            std::fs::read_to_string(&ledger).unwrap(),
            "date,amount\n01.03.2024,-5\n"
        );
    }

    #[test]
    fn remote_ledger_is_read_only() {
        let mut s = settings(PathBuf::from("unused.csv"));
        s.ledger_source = LedgerSource::Url("https://example.com/deposit.csv".into());
        let tracker = FundTracker::with_registry(s, MarketDataRegistry::new()).unwrap();
        assert!(matches!(
            tracker.record_deposit(d(2024, 3, 1), None),
            Err(CoreError::ValidationError(_))
        ));
    }
}
