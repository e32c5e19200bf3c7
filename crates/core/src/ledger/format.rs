use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::CoreError;
use crate::models::deposit::{DepositEntry, DepositLedger};

/// Column names, in file order.
pub const DATE_COLUMN: &str = "date";
pub const AMOUNT_COLUMN: &str = "amount";

/// Dates are written day-first: `15.01.2024`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Older files rewritten by other tools may carry ISO dates.
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A parsed ledger plus how many rows had to be ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLedger {
    pub ledger: DepositLedger,
    pub skipped_rows: usize,
}

/// Parse ledger CSV text.
///
/// Layout:
/// ```text
/// date,amount
/// 01.01.2024,100
/// 01.02.2024,-12.50
/// ```
///
/// Blank input is an empty ledger. A header without both `date` and
/// `amount` columns is a format error. Individual malformed rows are
/// skipped (a writer may be mid-append) and counted in `skipped_rows`.
pub fn parse_ledger(text: &str) -> Result<ParsedLedger, CoreError> {
    if text.trim().is_empty() {
        return Ok(ParsedLedger::default());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let (date_idx, amount_idx) = match (column(DATE_COLUMN), column(AMOUNT_COLUMN)) {
        (Some(d), Some(a)) => (d, a),
        _ => {
            return Err(CoreError::InvalidLedgerFormat(format!(
                "expected '{DATE_COLUMN}' and '{AMOUNT_COLUMN}' columns, found: {}",
                headers.iter().collect::<Vec<_>>().join(",")
            )))
        }
    };

    let mut entries = Vec::new();
    let mut skipped_rows = 0;

    for (idx, record) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable ledger row {line}: {e}");
                skipped_rows += 1;
                continue;
            }
        };
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let date = record.get(date_idx).and_then(parse_date);
        let amount = record.get(amount_idx).and_then(parse_amount);
        match (date, amount) {
            (Some(date), Some(amount)) => entries.push(DepositEntry::new(date, amount)),
            _ => {
                warn!("Skipping malformed ledger row {line}: {record:?}");
                skipped_rows += 1;
            }
        }
    }

    Ok(ParsedLedger {
        ledger: DepositLedger::from_entries(entries),
        skipped_rows,
    })
}

/// Render one entry as a CSV line (without trailing newline).
pub fn format_entry(entry: &DepositEntry) -> Result<String, CoreError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record([
        entry.date.format(DATE_FORMAT).to_string(),
        entry.amount.to_string(),
    ])?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    let line = String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))?;
    Ok(line.trim_end().to_string())
}

/// The header line written to a brand-new ledger file.
pub fn header_line() -> String {
    format!("{DATE_COLUMN},{AMOUNT_COLUMN}")
}

/// Day-first date, falling back to ISO. A trailing time part is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    std::iter::once(DATE_FORMAT)
        .chain(FALLBACK_DATE_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.is_empty() {
        return None;
    }
    Decimal::from_str(unsigned).ok()
}
