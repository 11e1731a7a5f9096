//! Constants for the download module (timeouts, buffering, artifact names).

use std::time::Duration;

/// HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Inactivity timeout while reading a response body (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Whole-request timeout for page fetches, form posts and range probes.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size of the writer between the response stream and the partial file (1 MiB).
pub const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Prefix of the hidden per-content partial and sidecar files.
pub const PARTIAL_PREFIX: &str = ".cdvl_partial_";
