mod config;
mod render;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use log::info;
use std::io::{BufRead, Write};

use fund_tracker_core::auth::AuthContext;
use fund_tracker_core::errors::CoreError;
use fund_tracker_core::ledger::format::DATE_FORMAT;
use fund_tracker_core::models::deposit::DepositEntry;
use fund_tracker_core::models::settings::MetricSelection;
use fund_tracker_core::services::ledger_service::LedgerService;
use fund_tracker_core::FundTracker;

use config::{Cli, Command};

/// Password prompts before giving up.
const MAX_LOGIN_ATTEMPTS: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Dashboard {
            json,
            as_of,
            no_risk,
            no_comparison,
            no_chart,
        } => {
            let metrics = MetricSelection {
                risk_metrics: !no_risk,
                comparison: !no_comparison,
                price_history: !no_chart,
            };
            let settings = cli.config.into_settings(metrics)?;
            let tracker = FundTracker::new(settings).context("failed to start the dashboard")?;
            let auth = login(&tracker)?;

            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let report = tracker.evaluate(&auth, as_of).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::render_report(&report)?);
            }
        }

        Command::Deposit { amount, date } => {
            let source = cli.config.ledger_source();
            let currency = cli.config.fx_pair.quote.clone();
            let entry = DepositEntry::new(
                date.unwrap_or_else(|| Local::now().date_naive()),
                amount.unwrap_or(cli.config.deposit_amount),
            );
            LedgerService::with_timeout(std::time::Duration::from_secs(cli.config.timeout_secs))
                .append_deposit(&source, &entry)
                .with_context(|| format!("failed to append to {source}"))?;
            println!(
                "Added new deposit entry: {}, {} {currency}",
                entry.date.format(DATE_FORMAT),
                entry.amount
            );
        }
    }

    Ok(())
}

/// Prompt for the shared password on stdin, re-asking after a wrong entry.
fn login(tracker: &FundTracker) -> anyhow::Result<AuthContext> {
    let stdin = std::io::stdin();
    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        eprint!("Password: ");
        std::io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no password given");
        }
        match tracker.authenticate(line.trim_end_matches(['\r', '\n'])) {
            Ok(auth) => return Ok(auth),
            Err(CoreError::AuthenticationFailed) => {
                info!("Login attempt {attempt} rejected");
                eprintln!("Invalid password");
            }
            Err(e) => return Err(e.into()),
        }
    }
    bail!("too many failed login attempts")
}
