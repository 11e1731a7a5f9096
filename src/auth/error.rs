//! Login failure taxonomy.

use thiserror::Error;

use crate::extract::ExtractError;

/// Errors that can occur while establishing an authenticated session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The configured login URL does not parse.
    #[error("invalid login URL: {url}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
    },

    /// Transport failure while talking to the login endpoint.
    #[error("network error during login at {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The login page itself did not load.
    #[error("failed to fetch login page: HTTP {status}")]
    LoginPageStatus {
        /// Status code returned.
        status: u16,
    },

    /// The login page is missing its CSRF token.
    #[error("login page is missing form tokens: {0}")]
    Tokens(#[source] ExtractError),

    /// The form post did not land on the members area.
    #[error("login rejected: HTTP {status}, final URL {final_url}{}", banner_suffix(.message))]
    Rejected {
        /// Final status after redirects.
        status: u16,
        /// Final URL after redirects.
        final_url: String,
        /// Text of the page's error banner, if any.
        message: Option<String>,
    },

    /// The post looked successful but the identity cookie was never set.
    #[error("login appeared successful but no session cookie was set")]
    MissingSessionCookie,
}

fn banner_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

impl AuthError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }
}
