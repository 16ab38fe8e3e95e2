// src/irs/client.rs
use std::path::Path;
use std::time::Duration;

use reqwest::header;

use crate::irs::models::{parse_index, FilingIndexEntry, RawFiling};
use crate::utils::error::{FetchError, IndexError};

// The AWS mirror is not rate limited the way EDGAR is, but a short pause
// between requests keeps a long run polite.
const REQUEST_DELAY_MS: u64 = 50;

/// HTTP client for the S3 mirror of Form 990 filings.
pub struct IrsClient {
    http: reqwest::Client,
    base_url: String,
}

impl IrsClient {
    /// Builds a client with an explicit per-request timeout. Redirects are
    /// capped by reqwest's default policy, so a redirect loop surfaces as an
    /// error rather than hanging the run.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_millis(REQUEST_DELAY_MS)).await;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/xml,text/csv,text/plain,*/*")
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            return Err(FetchError::Http(status));
        }

        let body = response.text().await.map_err(FetchError::from_transport)?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Downloads one filing document and prepares it for XML parsing.
    pub async fn fetch_filing(&self, entry: &FilingIndexEntry) -> Result<RawFiling, FetchError> {
        let url = entry.filing_url(&self.base_url);
        tracing::debug!("Downloading filing from: {}", url);
        let body = self.get_text(&url).await?;
        Ok(RawFiling::from_body(entry.object_id, body))
    }

    /// Retrieves the filing index, preferring the local cache. On a cache
    /// miss (or with `refresh` set) the index is fetched once, persisted
    /// verbatim for later runs, and then parsed.
    pub async fn load_index(
        &self,
        index_url: &str,
        cache_path: &Path,
        refresh: bool,
    ) -> Result<Vec<FilingIndexEntry>, IndexError> {
        if !refresh && cache_path.exists() {
            tracing::info!("Reading filing index from cache: {}", cache_path.display());
            let body = std::fs::read_to_string(cache_path)?;
            return parse_index(&body);
        }

        tracing::info!("Fetching filing index from: {}", index_url);
        let body = self.get_text(index_url).await?;

        if let Some(parent) = cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(cache_path, &body)?;
        tracing::info!("Persisted filing index to: {}", cache_path.display());

        parse_index(&body)
    }
}
