use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::time::Duration;

use fund_tracker_core::ledger::format::parse_date;
use fund_tracker_core::models::price::FxPair;
use fund_tracker_core::models::settings::{
    ComparisonSettings, LedgerSource, MetricSelection, Settings, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_RISK_FREE_RATE,
};

#[derive(Debug, Parser)]
#[command(name = "fund-tracker", version, about = "Shared fund and savings dashboard")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and show the portfolio dashboard
    Dashboard {
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Evaluate as of this date instead of today (dd.mm.yyyy or yyyy-mm-dd)
        #[arg(long, value_parser = parse_cli_date)]
        as_of: Option<NaiveDate>,

        /// Skip volatility and Sharpe ratio
        #[arg(long)]
        no_risk: bool,

        /// Skip the comparison asset
        #[arg(long)]
        no_comparison: bool,

        /// Skip the price trend table
        #[arg(long)]
        no_chart: bool,
    },

    /// Append a deposit row to the ledger file
    Deposit {
        /// Amount to post; defaults to the configured deposit amount
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<Decimal>,

        /// Date of the deposit; defaults to today
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,
    },
}

/// Configuration surface. Every flag falls back to a `FUND_TRACKER_*`
/// environment variable, which may come from a `.env` file.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Shared dashboard password
    #[arg(long, env = "FUND_TRACKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Number of fund shares held
    #[arg(long, env = "FUND_TRACKER_NUM_SHARES")]
    pub num_shares: Option<u32>,

    /// Fund ISIN (display only)
    #[arg(long, env = "FUND_TRACKER_ISIN")]
    pub isin: Option<String>,

    /// Market-data ticker of the fund
    #[arg(long, env = "FUND_TRACKER_TICKER")]
    pub ticker: Option<String>,

    /// Purchase date
    #[arg(long, env = "FUND_TRACKER_START_DATE", value_parser = parse_cli_date)]
    pub start_date: Option<NaiveDate>,

    /// Cash balance before any ledger deposits
    #[arg(long, env = "FUND_TRACKER_INITIAL_SAVINGS")]
    pub initial_savings: Option<Decimal>,

    /// First day of price history (defaults to the purchase date)
    #[arg(long, env = "FUND_TRACKER_HISTORY_START", value_parser = parse_cli_date)]
    pub history_start: Option<NaiveDate>,

    /// Fund currency / home currency
    #[arg(long, env = "FUND_TRACKER_FX_PAIR", default_value = "USD/CHF", value_parser = parse_fx_pair)]
    pub fx_pair: FxPair,

    /// Deposit ledger: a file path or an http(s) URL
    #[arg(long, env = "FUND_TRACKER_LEDGER", default_value = "deposit.csv")]
    pub ledger: String,

    /// Annual risk-free rate as a fraction
    #[arg(long, env = "FUND_TRACKER_RISK_FREE_RATE", default_value_t = DEFAULT_RISK_FREE_RATE)]
    pub risk_free_rate: f64,

    /// Per-request fetch timeout in seconds
    #[arg(long, env = "FUND_TRACKER_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Fixed amount posted by the deposit job
    #[arg(long, env = "FUND_TRACKER_DEPOSIT_AMOUNT", default_value = "20")]
    pub deposit_amount: Decimal,

    /// Ticker of an asset to compare the fund against
    #[arg(long, env = "FUND_TRACKER_COMPARE_TICKER")]
    pub compare_ticker: Option<String>,

    /// Display label of the comparison asset
    #[arg(long, env = "FUND_TRACKER_COMPARE_LABEL")]
    pub compare_label: Option<String>,
}

impl ConfigArgs {
    pub fn ledger_source(&self) -> LedgerSource {
        LedgerSource::parse(&self.ledger)
    }

    /// Full engine settings; fails naming the first missing value.
    pub fn into_settings(self, metrics: MetricSelection) -> anyhow::Result<Settings> {
        let ledger_source = self.ledger_source();
        let mut settings = Settings::new(
            required(self.password, "FUND_TRACKER_PASSWORD")?,
            required(self.num_shares, "FUND_TRACKER_NUM_SHARES")?,
            required(self.isin, "FUND_TRACKER_ISIN")?,
            required(self.ticker, "FUND_TRACKER_TICKER")?,
            required(self.start_date, "FUND_TRACKER_START_DATE")?,
            required(self.initial_savings, "FUND_TRACKER_INITIAL_SAVINGS")?,
            ledger_source,
        );
        settings.history_start = self.history_start;
        settings.fx_pair = self.fx_pair;
        settings.risk_free_rate_annual = self.risk_free_rate;
        settings.fetch_timeout = Duration::from_secs(self.timeout_secs);
        settings.deposit_amount = self.deposit_amount;
        settings.comparison = self.compare_ticker.map(|ticker| {
            let ticker = ticker.trim().to_uppercase();
            ComparisonSettings {
                label: self.compare_label.unwrap_or_else(|| ticker.clone()),
                ticker,
            }
        });
        settings.metrics = metrics;
        settings.validate().context("invalid configuration")?;
        Ok(settings)
    }
}

fn required<T>(value: Option<T>, name: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow!("missing configuration: set {name} or pass the matching flag"))
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{s}': expected dd.mm.yyyy or yyyy-mm-dd"))
}

fn parse_fx_pair(s: &str) -> Result<FxPair, String> {
    FxPair::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "fund-tracker",
            "--password",
            "hunter2",
            "--num-shares",
            "10",
            "--isin",
            "IE00B3RBWM25",
            "--ticker",
            "vt",
            "--start-date",
            "01.08.2023",
            "--initial-savings",
            "500",
        ]
    }

    #[test]
    fn builds_settings_from_flags() {
        let mut args = base_args();
        args.extend(["--compare-ticker", "spy", "dashboard"]);
        let cli = Cli::try_parse_from(args).unwrap();
        let settings = cli.config.into_settings(MetricSelection::default()).unwrap();

        assert_eq!(settings.ticker, "VT");
        assert_eq!(settings.share_count, 10);
        assert_eq!(settings.start_date, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
        assert_eq!(settings.fx_pair, FxPair::new("USD", "CHF"));
        assert_eq!(settings.deposit_amount, Decimal::from(20));
        let cmp = settings.comparison.unwrap();
        assert_eq!(cmp.ticker, "SPY");
        assert_eq!(cmp.label, "SPY");
    }

    #[test]
    fn missing_required_value_is_reported() {
        let cli = Cli::try_parse_from(["fund-tracker", "--ledger", "x.csv", "deposit"]).unwrap();
        let err = cli.config.into_settings(MetricSelection::default()).unwrap_err();
        assert!(err.to_string().contains("FUND_TRACKER_"));
    }

    #[test]
    fn deposit_accepts_negative_correction() {
        let cli = Cli::try_parse_from(["fund-tracker", "deposit", "--amount", "-5", "--date", "2024-01-15"])
            .unwrap();
        match cli.command {
            Command::Deposit { amount, date } => {
                assert_eq!(amount, Some(Decimal::from(-5)));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
