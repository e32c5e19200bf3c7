use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::errors::CoreError;
use crate::ledger::store;
use crate::models::deposit::{DepositEntry, DepositLedger};
use crate::models::report::{LedgerBalance, LedgerStatus};
use crate::models::settings::{LedgerSource, DEFAULT_FETCH_TIMEOUT_SECS};

/// Maintains the cash side of the portfolio: the deposit ledger.
///
/// Reading never fails outward. An unreadable ledger degrades to the
/// initial savings and is flagged `LedgerStatus::Unavailable`.
pub struct LedgerService {
    client: Client,
    timeout: Duration,
}

impl LedgerService {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, timeout }
    }

    /// Balance as of `as_of`; `None` means the ledger could not be read.
    pub fn balance_as_of(
        ledger: Option<&DepositLedger>,
        initial: Decimal,
        as_of: NaiveDate,
    ) -> Decimal {
        ledger.map_or(initial, |l| l.balance_as_of(initial, as_of))
    }

    /// Pure append: a new ledger with every prior entry plus `entry`.
    pub fn append(ledger: DepositLedger, entry: DepositEntry) -> DepositLedger {
        ledger.append(entry)
    }

    /// Read the ledger and compute the balance. Never returns an error.
    pub async fn load_balance(
        &self,
        source: &LedgerSource,
        initial: Decimal,
        as_of: NaiveDate,
    ) -> LedgerBalance {
        match store::read_ledger(source, &self.client, self.timeout).await {
            Ok(parsed) => {
                let balance = parsed.ledger.balance_as_of(initial, as_of);
                if parsed.skipped_rows > 0 {
                    warn!("Ledger {source}: ignored {} malformed rows", parsed.skipped_rows);
                }
                debug!("Cash balance as of {as_of}: {balance}");
                LedgerBalance {
                    balance,
                    status: LedgerStatus::Available {
                        entries: parsed.ledger.len(),
                        skipped_rows: parsed.skipped_rows,
                    },
                }
            }
            Err(e) => {
                warn!("Could not load deposits ledger {source}: {e}");
                LedgerBalance {
                    balance: Self::balance_as_of(None, initial, as_of),
                    status: LedgerStatus::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// Append one deposit row to a file ledger.
    pub fn append_deposit(
        &self,
        source: &LedgerSource,
        entry: &DepositEntry,
    ) -> Result<(), CoreError> {
        match source {
            LedgerSource::File(path) => store::append_entry(path, entry),
            LedgerSource::Url(url) => Err(CoreError::ValidationError(format!(
                "Cannot append to a remote ledger ({url}); configure a file path"
            ))),
        }
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
