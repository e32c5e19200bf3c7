use log::{debug, info};
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::deposit::DepositEntry;
use crate::models::settings::LedgerSource;

use super::format::{self, ParsedLedger};

/// Read and parse the ledger from its source.
///
/// A missing file is `LedgerUnavailable` here; only the append path treats
/// a missing file as an empty ledger.
pub async fn read_ledger(
    source: &LedgerSource,
    client: &Client,
    timeout: Duration,
) -> Result<ParsedLedger, CoreError> {
    let text = match source {
        LedgerSource::File(path) => read_file(path)?,
        LedgerSource::Url(url) => fetch_url(client, url, timeout).await?,
    };
    let parsed = format::parse_ledger(&text)?;
    debug!(
        "Read {} ledger entries from {source} ({} skipped)",
        parsed.ledger.len(),
        parsed.skipped_rows
    );
    Ok(parsed)
}

/// Append one entry to a ledger file.
///
/// Creates the file (with header) when it does not exist. Existing bytes are
/// copied through untouched; the new content is written to a temp file in
/// the same directory and renamed over the original, so a reader never sees
/// a half-written row. Two concurrent appenders can still race (last rename
/// wins), they just cannot interleave bytes.
pub fn append_entry(path: &Path, entry: &DepositEntry) -> Result<(), CoreError> {
    let mut content = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if content.iter().all(|b| b.is_ascii_whitespace()) {
        content.clear();
        content.extend_from_slice(format::header_line().as_bytes());
        content.push(b'\n');
    } else if content.last() != Some(&b'\n') {
        content.push(b'\n');
    }
    content.extend_from_slice(format::format_entry(entry)?.as_bytes());
    content.push(b'\n');

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    info!("Appended deposit {} {} to {}", entry.date, entry.amount, path.display());
    Ok(())
}

fn read_file(path: &Path) -> Result<String, CoreError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            CoreError::LedgerUnavailable(format!("{} does not exist", path.display()))
        }
        _ => CoreError::FileIO(format!("{}: {e}", path.display())),
    })
}

async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> Result<String, CoreError> {
    let request = async {
        client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    };
    let text = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| CoreError::Timeout(timeout.as_secs()))??;
    Ok(text)
}
