//! Resumable streaming downloader.
//!
//! One attempt runs: probe → partial validation → GET (ranged when resuming)
//! → stream into the partial file → verify → rename. A 416 on a resume drops
//! the stale partial and restarts once without resume. Any other failure
//! leaves the partial file and its sidecar in place for the next run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::constants::WRITE_BUFFER_SIZE;
use super::error::DownloadError;
use super::filename::{parse_content_disposition, resolve_final_path};
use super::partial::{PartialDownloadMetadata, PartialPaths, remove_if_exists};
use super::probe::{RangeProbe, probe_range_support};
use super::size::format_bytes;
use crate::progress::{NoopReporter, ProgressReporter};
use crate::session::Session;

/// Per-download knobs.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions<'a> {
    /// Destination, absolute or relative to the output directory.
    pub output_path: Option<&'a Path>,
    /// Enables id-keyed partial files and therefore resume.
    pub content_id: Option<u64>,
    pub resume: bool,
}

impl Default for DownloadOptions<'_> {
    fn default() -> Self {
        Self {
            output_path: None,
            content_id: None,
            resume: true,
        }
    }
}

/// Result of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    /// Final on-disk size, including any resumed prefix.
    pub bytes_written: u64,
    pub expected_size: Option<u64>,
    pub resumed: bool,
}

/// Streams files into an output directory using the session's client.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Creates a downloader sharing `session`'s client and cookies.
    #[must_use]
    pub fn new(session: &Session, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(session.client().clone(), output_dir)
    }

    /// Creates a downloader from a bare client.
    #[must_use]
    pub fn with_client(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Replaces the progress reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Downloads `url`, resuming a previous partial when possible.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the URL is invalid, the server answers
    /// with an unexpected status, the transfer fails, or the filesystem does.
    #[must_use = "download result contains the final path"]
    #[instrument(skip(self, options), fields(url = %url, content_id = ?options.content_id))]
    pub async fn download_file(
        &self,
        url: &str,
        options: DownloadOptions<'_>,
    ) -> Result<DownloadOutcome, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let result = match self.attempt(&parsed, options).await {
            Err(DownloadError::RangeNotSatisfiable { .. }) if options.resume => {
                warn!("Range not satisfiable (416), restarting download from beginning");
                self.attempt(
                    &parsed,
                    DownloadOptions {
                        resume: false,
                        ..options
                    },
                )
                .await
            }
            other => other,
        };

        if let Err(e) = &result {
            error!(kind = e.kind(), error = %e, "Download failed");
        }
        result
    }

    async fn attempt(
        &self,
        url: &Url,
        options: DownloadOptions<'_>,
    ) -> Result<DownloadOutcome, DownloadError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DownloadError::io(&self.output_dir, e))?;

        let probe = match options.content_id {
            Some(_) if options.resume => {
                let probe = probe_range_support(&self.client, url).await;
                info!(
                    supports_ranges = probe.supports_ranges,
                    total_size = ?probe.total_size,
                    "Probed range support"
                );
                probe
            }
            _ => RangeProbe::default(),
        };

        let id_paths = options
            .content_id
            .map(|id| (id, PartialPaths::for_content(&self.output_dir, id)));

        let mut resume_from = 0;
        if let Some((id, paths)) = &id_paths
            && options.resume
            && probe.supports_ranges
            && let Some(offset) = paths.resume_offset(*id, probe.total_size).await
        {
            info!(
                partial = %format_bytes(offset),
                total = %probe.total_size.map_or_else(|| "unknown".to_string(), format_bytes),
                "Partial download found, resuming"
            );
            resume_from = offset;
        }

        let mut request = self.client.get(url.clone());
        if resume_from > 0 {
            request = request.header(RANGE, format!("bytes={resume_from}-"));
        }
        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        let append = if resume_from > 0 {
            match status {
                StatusCode::PARTIAL_CONTENT => {
                    info!("Resume accepted by server (206 Partial Content)");
                    true
                }
                StatusCode::OK => {
                    warn!("Server returned 200 instead of 206, restarting download from beginning");
                    false
                }
                StatusCode::RANGE_NOT_SATISFIABLE => {
                    if let Some((_, paths)) = &id_paths {
                        paths.remove().await?;
                    }
                    return Err(DownloadError::RangeNotSatisfiable {
                        url: url.to_string(),
                    });
                }
                other => return Err(DownloadError::http_status(url.as_str(), other.as_u16())),
            }
        } else {
            if !status.is_success() {
                return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
            }
            false
        };
        let offset = if append { resume_from } else { 0 };

        let server_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition);
        if let Some(name) = &server_filename {
            debug!(filename = %name, "Filename from server");
        }
        let final_path = resolve_final_path(
            &self.output_dir,
            options.output_path,
            server_filename.as_deref(),
            options.content_id,
            url,
        );
        info!(path = %final_path.display(), "Target file");

        let response_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let expected_size = probe
            .total_size
            .or_else(|| response_length.map(|len| offset.saturating_add(len)));

        let paths = id_paths.map_or_else(|| PartialPaths::beside(&final_path), |(_, paths)| paths);
        let display_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(id) = options.content_id {
            paths
                .save_metadata(&PartialDownloadMetadata {
                    content_id: id,
                    content_length: expected_size,
                    filename: display_name.clone(),
                    started_at: Utc::now(),
                })
                .await?;
        }

        self.reporter
            .download_started(&display_name, offset, expected_size);
        let streamed = self.stream_to_partial(response, url, &paths.data, offset, append).await;
        self.reporter.download_finished();
        streamed?;

        let final_size = tokio::fs::metadata(&paths.data)
            .await
            .map_err(|e| DownloadError::io(&paths.data, e))?
            .len();
        match expected_size {
            Some(expected) if expected != final_size => warn!(
                expected = %format_bytes(expected),
                actual = %format_bytes(final_size),
                "Size mismatch after download"
            ),
            Some(_) => info!(size = %format_bytes(final_size), "Download complete, size verified"),
            None => info!(size = %format_bytes(final_size), "Download complete"),
        }

        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }
        remove_if_exists(&final_path).await?;
        tokio::fs::rename(&paths.data, &final_path)
            .await
            .map_err(|e| DownloadError::io(&final_path, e))?;
        if let Some(meta) = &paths.meta {
            remove_if_exists(meta).await?;
        }

        info!(path = %final_path.display(), bytes = final_size, resumed = append, "Downloaded");
        Ok(DownloadOutcome {
            path: final_path,
            bytes_written: final_size,
            expected_size,
            resumed: append,
        })
    }

    /// Streams the body into the partial file, appending or truncating.
    async fn stream_to_partial(
        &self,
        response: Response,
        url: &Url,
        partial: &Path,
        offset: u64,
        append: bool,
    ) -> Result<u64, DownloadError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(partial)
            .await
            .map_err(|e| DownloadError::io(partial, e))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut downloaded = offset;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::network(url.as_str(), e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(partial, e))?;
            downloaded += chunk.len() as u64;
            self.reporter.bytes_transferred(downloaded);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(partial, e))?;
        Ok(downloaded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_without_id_uses_server_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", r#"attachment; filename="clip.yuv""#)
                    .set_body_bytes(b"video bytes".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = Downloader::with_client(Client::new(), dir.path());
        let outcome = downloader
            .download_file(&format!("{}/get", server.uri()), DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.path, dir.path().join("clip.yuv"));
        assert_eq!(outcome.bytes_written, 11);
        assert_eq!(outcome.expected_size, Some(11));
        assert!(!outcome.resumed);
        assert!(!dir.path().join("clip.yuv.partial").exists());
        assert_eq!(std::fs::read(&outcome.path).unwrap(), b"video bytes");
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let dir = TempDir::new().unwrap();
        let downloader = Downloader::with_client(Client::new(), dir.path());
        let result = downloader
            .download_file("not-a-valid-url", DownloadOptions::default())
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_http_error_without_resume() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = Downloader::with_client(Client::new(), dir.path());
        let result = downloader
            .download_file(
                &format!("{}/missing", server.uri()),
                DownloadOptions {
                    content_id: Some(5),
                    resume: false,
                    ..DownloadOptions::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
    }
}
