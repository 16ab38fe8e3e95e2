// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Redirect limit exceeded")]
    RedirectLimit,

    #[error("Network request failed: {0}")]
    Network(reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 500 Internal Server Error

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl FetchError {
    /// Classifies a transport failure from reqwest. Timeouts and redirect
    /// loops are expected per-filing conditions; everything else is an
    /// unexpected failure class.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_redirect() {
            FetchError::RedirectLimit
        } else {
            FetchError::Network(err)
        }
    }

    /// Whether the run controller may skip the current filing and continue.
    pub fn is_skippable(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::RedirectLimit)
    }
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to retrieve filing index: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse filing index: {0}")]
    Parse(#[from] csv::Error),

    #[error("I/O error on local index file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Filing index is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Index retrieval failed: {0}")]
    Index(#[from] IndexError),

    #[error("Filing retrieval failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
