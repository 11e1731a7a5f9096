//! Progress reporting seam between the library and the terminal UI.
//!
//! Library code only talks to [`ProgressReporter`]; the binary supplies an
//! indicatif-backed implementation and tests use [`NoopReporter`] or their
//! own recorder.

use crate::record::ContentType;

/// Receives progress events from sweeps and downloads.
///
/// All methods default to no-ops so implementors only override what they render.
pub trait ProgressReporter: Send + Sync {
    /// A sweep finished one ID. `found` is true when a record was written.
    fn sweep_item(&self, _content_type: ContentType, _id: u64, _found: bool) {}

    /// A sweep terminated after writing `records` records.
    fn sweep_finished(&self, _content_type: ContentType, _records: u64) {}

    /// A transfer is starting. `initial` is the resume offset.
    fn download_started(&self, _label: &str, _initial: u64, _total: Option<u64>) {}

    /// `downloaded` is the running total on disk, including any resumed prefix.
    fn bytes_transferred(&self, _downloaded: u64) {}

    /// The transfer ended, successfully or not.
    fn download_finished(&self) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}
