//! Form-based login against the site's CSRF-protected login page.

use reqwest::StatusCode;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::AuthError;
use crate::config::Credentials;
use crate::download::constants::METADATA_TIMEOUT;
use crate::extract::{LoginPageExtractor, PageExtractor, alert_message};
use crate::session::Session;

/// Cookie set by the site once the user is authenticated.
pub const SESSION_COOKIE: &str = ".AspNetCore.Identity.Application";

/// Post-login redirect target, also used to recognise success.
pub const MEMBERS_PATH: &str = "/members-section/";

/// Logs in once and leaves the identity cookie in the session's jar.
///
/// Succeeds only when the post lands on the members area with HTTP 200 and
/// the jar holds [`SESSION_COOKIE`] for the login URL's origin.
///
/// # Errors
///
/// Returns [`AuthError`] for a missing token, a bad status or redirect target,
/// a missing cookie, or a transport failure. There is no retry.
#[instrument(skip(session, credentials), fields(username = %credentials.username))]
pub async fn login(session: &Session, credentials: &Credentials) -> Result<(), AuthError> {
    let login_url = session.config().endpoints.login_url.clone();
    let parsed = Url::parse(&login_url).map_err(|_| AuthError::InvalidUrl {
        url: login_url.clone(),
    })?;

    info!("Fetching login page for CSRF tokens");
    let response = session
        .client()
        .get(parsed.clone())
        .timeout(METADATA_TIMEOUT)
        .send()
        .await
        .map_err(|e| AuthError::network(&login_url, e))?;
    if response.status() != StatusCode::OK {
        return Err(AuthError::LoginPageStatus {
            status: response.status().as_u16(),
        });
    }
    let html = response
        .text()
        .await
        .map_err(|e| AuthError::network(&login_url, e))?;
    let tokens = LoginPageExtractor
        .extract_str(&html)
        .map_err(AuthError::Tokens)?;
    debug!(has_ufprt = tokens.ufprt.is_some(), "Extracted login tokens");

    let mut form = vec![
        ("loginModel.RedirectUrl", MEMBERS_PATH),
        ("loginModel.Username", credentials.username.as_str()),
        ("loginModel.Password", credentials.password()),
        ("__RequestVerificationToken", tokens.verification_token.as_str()),
    ];
    if let Some(ufprt) = tokens.ufprt.as_deref() {
        form.push(("ufprt", ufprt));
    }

    info!("Submitting login form");
    let response = session
        .client()
        .post(parsed.clone())
        .timeout(METADATA_TIMEOUT)
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::network(&login_url, e))?;

    let status = response.status();
    let final_url = response.url().to_string();
    if status == StatusCode::OK && final_url.contains("members-section") {
        let origin = Url::parse(&parsed.origin().ascii_serialization()).unwrap_or(parsed);
        if session.has_cookie(&origin, SESSION_COOKIE) {
            info!("Login successful, session cookie established");
            return Ok(());
        }
        warn!("Login appeared successful but no session cookie found");
        return Err(AuthError::MissingSessionCookie);
    }

    let message = response.text().await.ok().and_then(|body| alert_message(&body));
    if let Some(message) = &message {
        error!(status = status.as_u16(), final_url = %final_url, message = %message, "Login failed");
    } else {
        error!(status = status.as_u16(), final_url = %final_url, "Login failed");
    }
    Err(AuthError::Rejected {
        status: status.as_u16(),
        final_url,
        message,
    })
}
