//! Sequential ID sweeps over video and dataset detail pages.
//!
//! A sweep walks ids upward in batches of `max_concurrent_requests`, fetching
//! each batch concurrently and handling results in id order. It stops once
//! `max_consecutive_failures` ids in a row came back empty or failed, or when
//! the configured ceiling is passed. The stop condition is only checked
//! between batches, so a batch always completes.

mod error;
mod output_log;

pub use error::{CrawlError, FetchError};
pub use output_log::{OutputLog, read_json_objects};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::download::constants::METADATA_TIMEOUT;
use crate::extract::{DetailPageExtractor, PageExtractor};
use crate::progress::{NoopReporter, ProgressReporter};
use crate::record::{ContentRecord, ContentType, content_url};
use crate::session::Session;

/// Per-sweep counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Records written.
    pub success: u64,
    /// Ids with no usable content.
    pub empty: u64,
    /// Ids whose fetch failed.
    pub failed: u64,
}

/// Stats for both sweeps of a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub videos: SweepStats,
    pub datasets: SweepStats,
}

/// Runs sweeps against the site with an authenticated [`Session`].
pub struct Crawler {
    session: Session,
    output_dir: PathBuf,
    reporter: Arc<dyn ProgressReporter>,
}

impl Crawler {
    #[must_use]
    pub fn new(session: Session, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
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

    /// Runs the video and dataset sweeps concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Io`] if the output directory cannot be created.
    #[instrument(skip(self), fields(output_dir = %self.output_dir.display()))]
    pub async fn crawl_all(&self) -> Result<CrawlSummary, CrawlError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| CrawlError::io(&self.output_dir, e))?;

        let (videos, datasets) = tokio::join!(
            self.sweep(ContentType::Video),
            self.sweep(ContentType::Dataset)
        );
        let summary = CrawlSummary { videos, datasets };
        info!(
            videos_found = summary.videos.success,
            datasets_found = summary.datasets.success,
            "Crawl complete"
        );
        Ok(summary)
    }

    /// Sweeps one id space, resuming after the highest id already in its log.
    #[instrument(skip(self))]
    pub async fn sweep(&self, content_type: ContentType) -> SweepStats {
        let config = self.session.config();
        let (file_name, start_id, max_id) = match content_type {
            ContentType::Video => (
                &config.output.videos_file,
                config.start_video_id,
                config.max_video_id,
            ),
            ContentType::Dataset => (
                &config.output.datasets_file,
                config.start_dataset_id,
                config.max_dataset_id,
            ),
        };
        let log = OutputLog::new(self.output_dir.join(file_name));
        let threshold = config.max_consecutive_failures;
        let width = config.max_concurrent_requests.max(1);
        let batch_span = width as u64 - 1;
        let delay = config.request_delay();
        let semaphore = Semaphore::new(width);

        let last_id = log.last_id().await;
        let mut current = (last_id + 1).max(start_id);
        if last_id > 0 {
            info!(last_id, resume_from = current, "Resuming sweep from log");
        }
        info!(start = current, max_id = ?max_id, path = %log.path().display(), "Starting sweep");

        let mut stats = SweepStats::default();
        let mut consecutive_failures = 0u32;
        loop {
            if consecutive_failures >= threshold {
                info!(consecutive_failures, "Stopping sweep after consecutive empty or failed ids");
                break;
            }
            if max_id.is_some_and(|max| current > max) {
                info!(current, "Reached configured max id");
                break;
            }

            let end = match max_id {
                Some(max) => max.min(current.saturating_add(batch_span)),
                None => current.saturating_add(batch_span),
            };
            let ids: Vec<u64> = (current..=end).collect();
            let results = join_all(ids.iter().map(|&id| {
                let semaphore = &semaphore;
                async move {
                    let _permit = semaphore.acquire().await.ok();
                    self.fetch(content_type, id).await
                }
            }))
            .await;

            for (id, result) in ids.into_iter().zip(results) {
                let found = match result {
                    Ok(Some(record)) => match log.append(&record).await {
                        Ok(()) => {
                            stats.success += 1;
                            consecutive_failures = 0;
                            info!(id, title = record.title.as_deref().unwrap_or(""), "Found record");
                            true
                        }
                        Err(e) => {
                            error!(id, error = %e, "Failed to write record");
                            stats.failed += 1;
                            consecutive_failures += 1;
                            false
                        }
                    },
                    Ok(None) => {
                        stats.empty += 1;
                        consecutive_failures += 1;
                        false
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Fetch failed");
                        stats.failed += 1;
                        consecutive_failures += 1;
                        false
                    }
                };
                self.reporter.sweep_item(content_type, id, found);
            }

            current = end.saturating_add(1);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        self.reporter.sweep_finished(content_type, stats.success);
        info!(
            success = stats.success,
            empty = stats.empty,
            failed = stats.failed,
            "Sweep finished"
        );
        stats
    }

    /// Fetches and parses one id. `Ok(None)` means the page had no content.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for transport failures and timeouts.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(
        &self,
        content_type: ContentType,
        id: u64,
    ) -> Result<Option<ContentRecord>, FetchError> {
        let endpoints = &self.session.config().endpoints;
        let base = match content_type {
            ContentType::Video => &endpoints.video_base_url,
            ContentType::Dataset => &endpoints.dataset_base_url,
        };
        let url = content_url(base, content_type, id);

        let response = self
            .session
            .client()
            .get(&url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| FetchError::network(&url, e))?;
        if response.status() != StatusCode::OK {
            debug!(status = response.status().as_u16(), "Non-200 response");
            return Ok(None);
        }
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::network(&url, e))?;

        let Some(content) = DetailPageExtractor
            .extract_str(&html)
            .map_err(|source| FetchError::Extract {
                url: url.clone(),
                source,
            })?
        else {
            return Ok(None);
        };

        Ok(Some(ContentRecord {
            id,
            url,
            title: content.title,
            paragraphs: content.paragraphs,
            links: content.links,
            media: content.media,
            tables_count: content.tables_count,
            filename: content.filename,
            file_size: content.file_size,
            extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            content_type,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DETAIL: &str = r#"<html><body><div class="main-container container-fluid"><div><div>
        <h1>Clip</h1><p>A description long enough.</p></div></div></div></body></html>"#;

    fn crawler(server: &MockServer, dir: &TempDir) -> Crawler {
        let mut config = Config::default();
        config.endpoints.video_base_url = format!("{}/view-file/", server.uri());
        config.request_delay = 0.0;
        Crawler::new(Session::new(config).unwrap(), dir.path())
    }

    #[tokio::test]
    async fn test_fetch_builds_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/view-file/"))
            .and(query_param("videoid", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let record = crawler(&server, &dir)
            .fetch(ContentType::Video, 4)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, 4);
        assert!(record.url.ends_with("/view-file/?videoid=4"));
        assert_eq!(record.title.as_deref(), Some("Clip"));
        assert!(record.extracted_at.ends_with("+00:00"));
        assert_eq!(record.content_type, ContentType::Video);
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let result = crawler(&server, &dir).fetch(ContentType::Video, 1).await.unwrap();
        assert_eq!(result, None);
    }
}
