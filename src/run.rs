// src/run.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::extractors::record::extract_record;
use crate::irs::client::IrsClient;
use crate::storage::DatasetWriter;
use crate::utils::error::AppError;

/// Everything one extraction run needs to know. Assembled from the CLI in
/// `main`, built directly in tests.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub index_url: String,
    pub base_url: String,
    pub index_cache: PathBuf,
    pub output: PathBuf,
    /// Caps how many filings are attempted; `None` walks the whole index.
    pub limit: Option<usize>,
    pub timeout: Duration,
    pub refresh_index: bool,
}

/// Outcome of a run. `fatal` carries the abort reason when the run stopped
/// early on an unexpected transport failure; the written count is valid
/// either way because the dataset is flushed before returning.
#[derive(Debug)]
pub struct RunSummary {
    pub attempted: usize,
    pub skipped: usize,
    pub written: usize,
    pub fatal: Option<String>,
}

/// Drives the whole pipeline: index → per-filing retrieval → extraction →
/// dataset flush.
///
/// Failure policy per filing: timeouts and redirect loops are logged and
/// skipped, as is a document that fails XML parsing. Any other transport
/// failure aborts the run, on the theory that it signals a systemic
/// problem (endpoint unreachable, credentials, DNS) where continuing would
/// waste work. Whatever was assembled before the abort is still written.
pub async fn execute(config: &RunConfig) -> Result<RunSummary, AppError> {
    let client = IrsClient::new(&config.base_url, config.timeout)?;

    let entries = client
        .load_index(&config.index_url, &config.index_cache, config.refresh_index)
        .await?;
    tracing::info!(
        "Index loaded: {} filings ({} through {})",
        entries.len(),
        entries.first().map(|e| e.taxpayer_name.as_str()).unwrap_or(""),
        entries.last().map(|e| e.taxpayer_name.as_str()).unwrap_or(""),
    );

    let mut writer = DatasetWriter::new(&config.output);
    let mut summary = RunSummary {
        attempted: 0,
        skipped: 0,
        written: 0,
        fatal: None,
    };

    let cap = config.limit.unwrap_or(entries.len());
    for entry in entries.iter().take(cap) {
        summary.attempted += 1;

        match client.fetch_filing(entry).await {
            Ok(filing) => match extract_record(&filing) {
                Ok(record) => writer.append(record),
                Err(e) => {
                    tracing::warn!("Skipping filing {}: malformed XML: {}", entry.object_id, e);
                    summary.skipped += 1;
                }
            },
            Err(e) if e.is_skippable() => {
                tracing::warn!("Skipping filing {}: {}", entry.object_id, e);
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    "Aborting run on filing {}: unexpected transport failure: {}",
                    entry.object_id,
                    e
                );
                summary.fatal = Some(e.to_string());
                break;
            }
        }
    }

    // Flush whatever was assembled, aborted or not.
    summary.written = writer.flush()?;
    writer.save_run_metadata(&summary)?;

    tracing::info!(
        "Run finished: {} attempted, {} skipped, {} written{}",
        summary.attempted,
        summary.skipped,
        summary.written,
        summary
            .fatal
            .as_deref()
            .map(|r| format!(", aborted: {}", r))
            .unwrap_or_default(),
    );

    Ok(summary)
}
