//! Partial-download artifacts: the data file and its JSON sidecar.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constants::PARTIAL_PREFIX;
use super::error::DownloadError;

/// Sidecar describing an in-progress download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDownloadMetadata {
    #[serde(alias = "video_id")]
    pub content_id: u64,
    /// Best-known total size at the time the attempt started.
    pub content_length: Option<u64>,
    /// Final file name the partial will be renamed to.
    pub filename: String,
    pub started_at: DateTime<Utc>,
}

/// Where one download keeps its in-progress bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPaths {
    pub data: PathBuf,
    /// `None` for downloads without a content id; those are never resumed.
    pub meta: Option<PathBuf>,
}

impl PartialPaths {
    /// `.cdvl_partial_{id}.tmp` plus `.cdvl_partial_{id}.meta` in `output_dir`.
    #[must_use]
    pub fn for_content(output_dir: &Path, content_id: u64) -> Self {
        Self {
            data: output_dir.join(format!("{PARTIAL_PREFIX}{content_id}.tmp")),
            meta: Some(output_dir.join(format!("{PARTIAL_PREFIX}{content_id}.meta"))),
        }
    }

    /// `<final>.partial` next to the destination, without a sidecar.
    #[must_use]
    pub fn beside(final_path: &Path) -> Self {
        let mut data = final_path.as_os_str().to_owned();
        data.push(".partial");
        Self {
            data: PathBuf::from(data),
            meta: None,
        }
    }

    /// Writes the sidecar (pretty JSON). No-op without a sidecar path.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Metadata`] or [`DownloadError::Io`].
    pub async fn save_metadata(&self, metadata: &PartialDownloadMetadata) -> Result<(), DownloadError> {
        let Some(meta_path) = &self.meta else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(metadata).map_err(|source| DownloadError::Metadata {
            path: meta_path.clone(),
            source,
        })?;
        tokio::fs::write(meta_path, json)
            .await
            .map_err(|e| DownloadError::io(meta_path.clone(), e))
    }

    /// Reads the sidecar; any read or parse failure yields `None`.
    pub async fn load_metadata(&self) -> Option<PartialDownloadMetadata> {
        let meta_path = self.meta.as_ref()?;
        let raw = tokio::fs::read_to_string(meta_path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!(path = %meta_path.display(), error = %e, "Ignoring unreadable partial metadata");
                None
            }
        }
    }

    /// Offset to resume from, when the partial is usable for `content_id`.
    ///
    /// Requires a non-empty data file, a readable sidecar naming the same id,
    /// and a size below `expected_total` when that is known.
    pub async fn resume_offset(&self, content_id: u64, expected_total: Option<u64>) -> Option<u64> {
        let size = tokio::fs::metadata(&self.data).await.ok()?.len();
        if size == 0 {
            return None;
        }
        let Some(metadata) = self.load_metadata().await else {
            debug!("No valid metadata found for partial file");
            return None;
        };
        if metadata.content_id != content_id {
            debug!(expected = content_id, found = metadata.content_id, "Partial metadata id mismatch");
            return None;
        }
        if expected_total.is_some_and(|total| size >= total) {
            debug!(size, expected_total = ?expected_total, "Partial file not smaller than expected total");
            return None;
        }
        Some(size)
    }

    /// Deletes the data file and sidecar, ignoring files that are already gone.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] for any other removal failure.
    pub async fn remove(&self) -> Result<(), DownloadError> {
        remove_if_exists(&self.data).await?;
        if let Some(meta) = &self.meta {
            remove_if_exists(meta).await?;
        }
        Ok(())
    }
}

pub(crate) async fn remove_if_exists(path: &Path) -> Result<(), DownloadError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}
