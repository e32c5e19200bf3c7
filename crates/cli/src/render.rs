use std::fmt::{self, Write};

use rust_decimal::prelude::ToPrimitive;

use fund_tracker_core::models::comparison::{ComparisonResult, RebasedPoint};
use fund_tracker_core::models::metric::{Metric, UndefinedReason};
use fund_tracker_core::models::report::{DashboardReport, LedgerStatus};

/// Rows shown in the price trend table.
const TREND_ROWS: usize = 12;

/// Labels are padded to this width; values start one column after it.
const LABEL_WIDTH: usize = 31;

/// Plain-text dashboard.
pub fn render_report(report: &DashboardReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, report)?;
    Ok(out)
}

/// One `label  value` line. Labels longer than the column push the value right.
fn row(out: &mut String, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(out, "  {label:<LABEL_WIDTH$} {value}")
}

fn write_report(out: &mut String, r: &DashboardReport) -> fmt::Result {
    let home = r.home_currency.as_str();
    let asset = r.asset_currency.as_str();
    let v = &r.valuation;

    writeln!(out, "Investment Dashboard — as of {}", r.as_of_date)?;
    writeln!(out)?;
    writeln!(out, "Portfolio Overview")?;

    let cash = money(r.cash.balance.to_f64().unwrap_or(0.0), home);
    let cash = match &r.cash.status {
        LedgerStatus::Available { skipped_rows, .. } if *skipped_rows > 0 => {
            format!("{cash}  ({skipped_rows} malformed ledger rows ignored)")
        }
        LedgerStatus::Available { .. } => cash,
        LedgerStatus::Unavailable { .. } => format!("{cash}  (initial savings only)"),
    };
    row(out, "Cash balance:", cash)?;

    match v.latest.price() {
        Some(price) => row(
            out,
            "Fund holdings:",
            format!("{} shares of {} (latest price: {price:.2} {asset})", v.share_count, r.isin),
        )?,
        None => row(out, "Fund holdings:", "Could not fetch latest price.")?,
    }
    row(out, &format!("Total fund value ({home}):"), metric_money(v.holding_value_home, home))?;
    row(out, "Fund profit since purchase:", metric_money(v.profit_home, home))?;
    row(out, "Profit since purchase (%):", metric_fixed(v.profit_percent, " %"))?;
    let total_note = if r.total_value_complete { "" } else { "  (excludes fund value)" };
    row(
        out,
        "Total portfolio value:",
        format!("{}{total_note}", money(r.total_value_home, home)),
    )?;

    if v.volatility_percent != Metric::Undefined(UndefinedReason::NotRequested) {
        writeln!(out)?;
        writeln!(out, "Risk")?;
        row(out, "Daily volatility:", metric_fixed(v.volatility_percent, " %"))?;
        row(out, "Sharpe ratio (daily):", metric_ratio(v.sharpe_ratio))?;
    }

    if let Some(cmp) = &r.comparison {
        writeln!(out)?;
        write_comparison(out, cmp, &r.ticker, home)?;
    }

    if !r.price_history.is_empty() {
        writeln!(out)?;
        writeln!(out, "Price Trend Since Purchase {} | {}", r.start_date, r.isin)?;
        let skip = r.price_history.len().saturating_sub(TREND_ROWS);
        for p in &r.price_history[skip..] {
            writeln!(out, "  {}  {:>10.2} {asset}", p.date, p.price)?;
        }
    }

    if !r.issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings")?;
        for issue in &r.issues {
            writeln!(out, "  ! {issue}")?;
        }
    }
    Ok(())
}

fn write_comparison(
    out: &mut String,
    cmp: &ComparisonResult,
    ticker: &str,
    home: &str,
) -> fmt::Result {
    writeln!(out, "Comparison: {ticker} vs {} ({})", cmp.label, cmp.ticker)?;
    let last = |s: &[RebasedPoint]| {
        s.last().map_or_else(|| "n/a".to_string(), |p| format!("{:.2}", p.value))
    };
    row(out, &format!("{ticker} (start = 100):"), last(&cmp.rebased_series_a))?;
    row(out, &format!("{} (start = 100):", cmp.ticker), last(&cmp.rebased_series_b))?;
    if !cmp.common_start {
        writeln!(out, "  Note: each series is indexed to its own first available date.")?;
    }
    row(out, "Initial investment:", metric_money(cmp.initial_investment_home, home))?;
    row(
        out,
        &format!("Value if invested in {}:", cmp.label),
        metric_money(cmp.counterfactual_value_home, home),
    )?;
    row(
        out,
        &format!("Profit if invested in {}:", cmp.label),
        metric_money(cmp.counterfactual_profit_home, home),
    )?;
    Ok(())
}

/// `CHF 1,234.56`; negatives as `CHF -1,234.56`.
pub fn money(value: f64, currency: &str) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{currency} {sign}{grouped}.{frac_part}")
}

fn metric_money(metric: Metric, currency: &str) -> String {
    match metric {
        Metric::Available(v) => money(v, currency),
        Metric::Undefined(reason) => format!("n/a ({reason})"),
    }
}

fn metric_fixed(metric: Metric, suffix: &str) -> String {
    match metric {
        Metric::Available(v) => format!("{v:.2}{suffix}"),
        Metric::Undefined(reason) => format!("n/a ({reason})"),
    }
}

fn metric_ratio(metric: Metric) -> String {
    match metric {
        Metric::Available(v) => format!("{v:.4}"),
        Metric::Undefined(reason) => format!("n/a ({reason})"),
    }
}
