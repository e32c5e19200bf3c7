use thiserror::Error;

/// Unified error type for the entire fund-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// Missing market data and an unreadable ledger are *not* fatal: the
/// `FundTracker` facade turns them into flags on the report. These variants
/// still exist so the lower layers can say what went wrong.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Ledger / File ───────────────────────────────────────────────
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Invalid ledger format: {0}")]
    InvalidLedgerFormat(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("No provider available for: {0}")]
    NoProvider(String),

    #[error("Price data unavailable for {symbol}: {reason}")]
    PriceDataUnavailable { symbol: String, reason: String },

    // ── Auth ────────────────────────────────────────────────────────
    #[error("Authentication failed — invalid password")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::InvalidLedgerFormat(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often contain full URLs; strip the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<tempfile::PersistError> for CoreError {
    fn from(e: tempfile::PersistError) -> Self {
        CoreError::FileIO(e.error.to_string())
    }
}
