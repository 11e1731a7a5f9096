//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a failed id in a
//! multi-id run can be reported on its own.

use std::path::PathBuf;

use thiserror::Error;

use crate::extract::ExtractError;

/// Errors that can occur while resolving or downloading a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect, request or read timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Unexpected HTTP status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server rejected the resume range (HTTP 416).
    #[error("range not satisfiable resuming {url}")]
    RangeNotSatisfiable {
        /// The download URL.
        url: String,
    },

    /// File system error (create, write, rename, remove).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The partial-download sidecar could not be serialized.
    #[error("failed to encode partial metadata {path}: {source}")]
    Metadata {
        /// Sidecar path.
        path: PathBuf,
        /// Serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The video page or link table did not contain what link resolution needs.
    #[error("could not resolve download link for video {video_id}: {source}")]
    LinkResolution {
        /// Video id being resolved.
        video_id: u64,
        /// What was missing.
        #[source]
        source: ExtractError,
    },
}

impl DownloadError {
    /// Creates a network error, promoting timeouts to [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a link-resolution error.
    pub fn link(video_id: u64, source: ExtractError) -> Self {
        Self::LinkResolution { video_id, source }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::Io { .. } => "io",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Metadata { .. } => "metadata",
            Self::LinkResolution { .. } => "link_resolution",
        }
    }
}

// No From<reqwest::Error>/From<io::Error>: every variant needs the url or path.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/file.mp4");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/file.mp4"));
        assert_eq!(error.kind(), "timeout");
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.mp4", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/file.mp4"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/.cdvl_partial_1.tmp"), io_error);
        assert!(error.to_string().contains("/tmp/.cdvl_partial_1.tmp"));
    }

    #[test]
    fn test_download_error_link_display() {
        let error = DownloadError::link(
            42,
            ExtractError::Missing {
                what: "table.downloadTable",
            },
        );
        let msg = error.to_string();
        assert!(msg.contains("video 42"), "{msg}");
        assert!(msg.contains("table.downloadTable"), "{msg}");
    }

    #[test]
    fn test_range_rejection_kind() {
        let error = DownloadError::RangeNotSatisfiable {
            url: "u".to_string(),
        };
        assert_eq!(error.kind(), "range_not_satisfiable");
    }
}
