//! CDVL Crawler Core Library
//!
//! Crawls the CDVL video archive through an authenticated member session,
//! records video and dataset metadata as JSON Lines, and downloads video
//! files with resumable range requests.
//!
//! # Architecture
//!
//! - [`config`] - Layered run configuration and credential resolution
//! - [`session`] - Shared HTTP client with cookie jar
//! - [`auth`] - Form login against the member area
//! - [`extract`] - HTML extractors for detail, login and download pages
//! - [`crawl`] - ID sweeps writing JSONL logs
//! - [`download`] - Download-link resolution and the resumable downloader
//! - [`export`] - CSV export and static site generation from a log
//! - [`license`] - One-time license acknowledgement
//! - [`progress`] - Progress reporting seam for the CLI

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod crawl;
pub mod download;
pub mod export;
pub mod extract;
pub mod license;
pub mod progress;
pub mod record;
pub mod session;

// Re-export commonly used types
pub use auth::{AuthError, login};
pub use config::{
    Config, ConfigError, ConfigLayer, CredentialError, Credentials, load_config,
    resolve_credentials,
};
pub use crawl::{CrawlError, CrawlSummary, Crawler, SweepStats};
pub use download::{
    DownloadError, DownloadOptions, DownloadOutcome, Downloader, get_download_link,
};
pub use export::{CsvExporter, ExportError, SiteError, SiteGenerator};
pub use license::LicenseGate;
pub use progress::{NoopReporter, ProgressReporter};
pub use record::{ContentRecord, ContentType};
pub use session::{Session, SessionError};
