//! Crawl error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::extract::ExtractError;

/// Transient failure fetching one id. Counts toward the stop threshold.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request timed out.
    #[error("timeout fetching {url}")]
    Timeout {
        /// Page URL.
        url: String,
    },

    /// Transport-level failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Page URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The page could not be scraped.
    #[error("failed to parse {url}: {source}")]
    Extract {
        /// Page URL.
        url: String,
        /// Underlying error.
        #[source]
        source: ExtractError,
    },
}

impl FetchError {
    /// Creates a network error, promoting timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }
}

/// Errors that stop a crawl outright.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Output directory or log file failure.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record without paragraphs was offered to the log.
    #[error("refusing to log record {id} without paragraphs")]
    InvalidRecord {
        /// Record id.
        id: u64,
    },

    /// A record could not be encoded as JSON.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CrawlError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
