//! Resolves a video id to its direct download URL.

use reqwest::StatusCode;
use tracing::{info, instrument};

use super::constants::METADATA_TIMEOUT;
use super::error::DownloadError;
use crate::extract::{DownloadFormExtractor, DownloadLinkExtractor, PageExtractor};
use crate::record::{ContentType, content_url};
use crate::session::Session;

/// Posts the page's download-manager form and reads the link table.
///
/// # Errors
///
/// Returns [`DownloadError`] when either request fails or returns non-200,
/// or when the form or link table is missing. Errors concern this id only.
#[instrument(skip(session))]
pub async fn get_download_link(session: &Session, video_id: u64) -> Result<String, DownloadError> {
    let page_url = content_url(
        &session.config().endpoints.video_base_url,
        ContentType::Video,
        video_id,
    );

    info!("Fetching video page");
    let response = session
        .client()
        .get(&page_url)
        .timeout(METADATA_TIMEOUT)
        .send()
        .await
        .map_err(|e| DownloadError::network(&page_url, e))?;
    if response.status() != StatusCode::OK {
        return Err(DownloadError::http_status(&page_url, response.status().as_u16()));
    }
    let html = response
        .text()
        .await
        .map_err(|e| DownloadError::network(&page_url, e))?;
    let form = DownloadFormExtractor
        .extract_str(&html)
        .map_err(|e| DownloadError::link(video_id, e))?;

    info!("Generating download link");
    let response = session
        .client()
        .post(&page_url)
        .timeout(METADATA_TIMEOUT)
        .form(&form.fields())
        .send()
        .await
        .map_err(|e| DownloadError::network(&page_url, e))?;
    if response.status() != StatusCode::OK {
        return Err(DownloadError::http_status(&page_url, response.status().as_u16()));
    }
    let html = response
        .text()
        .await
        .map_err(|e| DownloadError::network(&page_url, e))?;
    let link = DownloadLinkExtractor
        .extract_str(&html)
        .map_err(|e| DownloadError::link(video_id, e))?;

    info!(link = %link, "Download link generated");
    Ok(link)
}
