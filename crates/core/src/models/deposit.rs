use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single dated cash deposit.
///
/// Immutable once recorded. A negative amount is a correction, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEntry {
    /// Date the deposit counts from (daily granularity, no time component)
    pub date: NaiveDate,

    /// Signed amount in the home currency
    pub amount: Decimal,
}

impl DepositEntry {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self { date, amount }
    }
}

/// Append-only list of deposits.
///
/// Entry order is whatever the file had; the balance does not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLedger {
    entries: Vec<DepositEntry>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<DepositEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DepositEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `initial` plus every deposit dated on or before `as_of`.
    ///
    /// Future-dated entries never count.
    pub fn balance_as_of(&self, initial: Decimal, as_of: NaiveDate) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.date <= as_of)
            .fold(initial, |acc, e| acc + e.amount)
    }

    /// Return a new ledger with `entry` appended. No dedup, no sign check.
    #[must_use]
    pub fn append(mut self, entry: DepositEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sum of all deposits regardless of date.
    pub fn total_deposited(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Earliest and latest entry dates, if any.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.iter().map(|e| e.date).min()?;
        let last = self.entries.iter().map(|e| e.date).max()?;
        Some((first, last))
    }
}
