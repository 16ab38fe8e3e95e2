// src/irs/models.rs
use serde::Deserialize;

use crate::utils::error::IndexError;

/// One row of the AWS Form 990 filing index.
/// Example: https://s3.amazonaws.com/irs-form-990/index_2016.csv
///
/// The index carries more columns than these; only the object id (used to
/// build the retrieval URL) and the organization name are kept. Row order
/// is preserved for reproducibility.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingIndexEntry {
    #[serde(rename = "OBJECT_ID")]
    pub object_id: u64,
    #[serde(rename = "TAXPAYER_NAME")]
    pub taxpayer_name: String,
}

impl FilingIndexEntry {
    /// Constructs the URL of this filing's public XML document.
    pub fn filing_url(&self, base_url: &str) -> String {
        format!("{}/{}_public.xml", base_url.trim_end_matches('/'), self.object_id)
    }
}

/// Parses the raw index body as CSV. Columns other than `OBJECT_ID` and
/// `TAXPAYER_NAME` are ignored.
pub fn parse_index(body: &str) -> Result<Vec<FilingIndexEntry>, IndexError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let entries: Vec<FilingIndexEntry> =
        reader.deserialize().collect::<Result<_, csv::Error>>()?;
    if entries.is_empty() {
        return Err(IndexError::Empty);
    }
    Ok(entries)
}

/// The body of one retrieved filing, cleaned for XML parsing and owned by
/// the extraction step that fetched it.
#[derive(Debug)]
pub struct RawFiling {
    object_id: u64,
    xml: String,
}

impl RawFiling {
    /// Wraps a downloaded filing body. The S3 mirror prefixes documents with
    /// a small decoding artifact ahead of the XML declaration; everything
    /// before the first `<` is dropped.
    pub fn from_body(object_id: u64, body: String) -> Self {
        let xml = match body.find('<') {
            Some(start) => body[start..].to_string(),
            None => String::new(),
        };
        Self { object_id, xml }
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}
