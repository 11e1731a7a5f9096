//! Shared HTTP session: one client, one cookie jar, configured headers.
//!
//! Every component that talks to the site (login, sweeps, link resolution,
//! downloads) borrows the same [`Session`] so the authentication cookie set
//! during login rides along on later requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Errors raised while building the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// HTTP client plus cookie jar, cheap to clone.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    config: Arc<Config>,
}

impl Session {
    /// Builds a session with the configured default headers.
    ///
    /// The client keeps cookies, accepts gzip, and uses a 30 s connect timeout
    /// and a 300 s per-read timeout with no overall request deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidHeader`] or [`SessionError::Build`].
    pub fn new(config: Config) -> Result<Self, SessionError> {
        let headers = build_headers(&config)?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .gzip(true)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()
            .map_err(SessionError::Build)?;
        debug!(headers = config.headers.len(), "HTTP session created");
        Ok(Self {
            client,
            jar,
            config: Arc::new(config),
        })
    }

    /// The shared reqwest client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The run configuration this session was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true when the jar holds a cookie called `name` for `url`.
    #[must_use]
    pub fn has_cookie(&self, url: &Url, name: &str) -> bool {
        let Some(header) = self.jar.cookies(url) else {
            return false;
        };
        let Ok(raw) = header.to_str() else {
            return false;
        };
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(cookie_name, _)| cookie_name == name)
    }
}

fn build_headers(config: &Config) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| SessionError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| SessionError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut config = Config::default();
        config
            .headers
            .insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(
            Session::new(config),
            Err(SessionError::InvalidHeader { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("Accept-Language", "en-US,en;q=0.5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(Config::default()).unwrap();
        let response = session
            .client()
            .get(format!("{}/page", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_cookies_persist_across_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/set"))
            .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "token=abc; Path=/"))
            .mount(&server)
            .await;

        let session = Session::new(Config::default()).unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        assert!(!session.has_cookie(&base, "token"));

        session
            .client()
            .get(format!("{}/set", server.uri()))
            .send()
            .await
            .unwrap();
        assert!(session.has_cookie(&base, "token"));
        assert!(!session.has_cookie(&base, "tok"));
    }
}
