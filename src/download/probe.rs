//! Range-support probe using `GET` with `Range: bytes=0-0`.
//!
//! A `HEAD` request is not used because the download host does not answer it.

use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::constants::METADATA_TIMEOUT;

/// What the server told us about range support and total size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeProbe {
    pub supports_ranges: bool,
    pub total_size: Option<u64>,
}

/// Total size from a `Content-Range` value such as `bytes 0-0/5000000`.
///
/// `None` for `*` or anything unparsable.
#[must_use]
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    let total = total.trim();
    if total == "*" {
        return None;
    }
    total.parse().ok()
}

/// Probes `url`. Never fails: errors mean "no range support, size unknown".
#[instrument(skip(client), fields(url = %url))]
pub async fn probe_range_support(client: &Client, url: &Url) -> RangeProbe {
    let response = match client
        .get(url.clone())
        .header(RANGE, "bytes=0-0")
        .timeout(METADATA_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Range probe failed");
            return RangeProbe::default();
        }
    };

    match response.status() {
        StatusCode::PARTIAL_CONTENT => {
            let total_size = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_total);
            debug!(total_size = ?total_size, "Range probe: supported");
            // Drain the single byte so the connection can be reused.
            let _ = response.bytes().await;
            RangeProbe {
                supports_ranges: true,
                total_size,
            }
        }
        StatusCode::OK => {
            let total_size = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            debug!(total_size = ?total_size, "Range probe: not supported");
            // Dropped unread: the body may be the whole file.
            drop(response);
            RangeProbe {
                supports_ranges: false,
                total_size,
            }
        }
        status => {
            debug!(status = status.as_u16(), "Range probe: unexpected status");
            RangeProbe::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-0/5000000"), Some(5_000_000));
        assert_eq!(parse_content_range_total("bytes 0-0/*"), None);
        assert_eq!(parse_content_range_total("bytes 0-0"), None);
        assert_eq!(parse_content_range_total("bytes 0-0/abc"), None);
    }

    #[tokio::test]
    async fn test_probe_206_reports_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file"))
            .and(header("Range", "bytes=0-0"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", "bytes 0-0/5000000")
                    .set_body_bytes(b"x".to_vec()),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/file", server.uri())).unwrap();
        let probe = probe_range_support(&Client::new(), &url).await;
        assert_eq!(
            probe,
            RangeProbe {
                supports_ranges: true,
                total_size: Some(5_000_000)
            }
        );
    }

    #[tokio::test]
    async fn test_probe_200_reports_length_without_ranges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64]))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/file", server.uri())).unwrap();
        let probe = probe_range_support(&Client::new(), &url).await;
        assert!(!probe.supports_ranges);
        assert_eq!(probe.total_size, Some(64));
    }

    #[tokio::test]
    async fn test_probe_error_status_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/file", server.uri())).unwrap();
        assert_eq!(
            probe_range_support(&Client::new(), &url).await,
            RangeProbe::default()
        );
    }
}
