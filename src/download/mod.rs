//! Resumable HTTP downloads of archive videos.
//!
//! # Features
//!
//! - Range-support probe with `GET Range: bytes=0-0`
//! - Resume from id-keyed partial files validated by a JSON sidecar
//! - Streaming through a 1 MiB buffered writer
//! - Filename from Content-Disposition, with id- and URL-based fallbacks
//! - Download-link resolution through the video page's form
//!
//! # Example
//!
//! ```no_run
//! use cdvl_crawler::download::{DownloadOptions, Downloader};
//! use cdvl_crawler::{Config, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(Config::default())?;
//! let downloader = Downloader::new(&session, "./videos");
//! let outcome = downloader
//!     .download_file(
//!         "https://www.cdvl.org/GetFileDownload/42/token/file",
//!         DownloadOptions { content_id: Some(42), ..DownloadOptions::default() },
//!     )
//!     .await?;
//! println!("Downloaded: {}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod link;
mod partial;
mod probe;
mod size;

pub use client::{DownloadOptions, DownloadOutcome, Downloader};
pub use error::DownloadError;
pub use filename::{fallback_filename, parse_content_disposition, resolve_final_path, sanitize_filename};
pub use link::get_download_link;
pub use partial::{PartialDownloadMetadata, PartialPaths};
pub use probe::{RangeProbe, parse_content_range_total, probe_range_support};
pub use size::format_bytes;
