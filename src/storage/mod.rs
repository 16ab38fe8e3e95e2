// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::record::NPORecord;
use crate::run::RunSummary;
use crate::utils::error::StorageError;

/// Accumulates records for one extraction run and serializes them on
/// completion. Records are buffered in memory so a fatal abort can still
/// flush everything assembled up to that point.
pub struct DatasetWriter {
    out_path: PathBuf,
    records: Vec<NPORecord>,
}

impl DatasetWriter {
    pub fn new<P: AsRef<Path>>(out_path: P) -> Self {
        Self {
            out_path: out_path.as_ref().to_path_buf(),
            records: Vec::new(),
        }
    }

    /// Appends one assembled record, preserving arrival order.
    pub fn append(&mut self, record: NPORecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the accumulated dataset as CSV: one header row of column
    /// names, then one row per record. Any existing file at the output
    /// path is replaced. Returns the number of records written.
    pub fn flush(&self) -> Result<usize, StorageError> {
        if let Some(parent) = self.out_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.out_path)?;
        writer.write_record(NPORecord::columns())?;
        for record in &self.records {
            writer.write_record(record.to_row())?;
        }
        writer.flush().map_err(StorageError::Io)?;

        tracing::info!(
            "Wrote {} records to {}",
            self.records.len(),
            self.out_path.display()
        );
        Ok(self.records.len())
    }

    /// Saves a JSON sidecar describing the run next to the dataset.
    pub fn save_run_metadata(&self, summary: &RunSummary) -> Result<PathBuf, StorageError> {
        let mut file_path = self.out_path.clone();
        file_path.set_extension("meta.json");

        let metadata = serde_json::json!({
            "records_written": summary.written,
            "filings_attempted": summary.attempted,
            "filings_skipped": summary.skipped,
            "fatal_error": summary.fatal,
            "written_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&file_path, metadata_str)?;

        tracing::info!("Saved run metadata to {}", file_path.display());
        Ok(file_path)
    }
}
