//! HTML extraction rules, one [`PageExtractor`] per page type.
//!
//! Extractors are synchronous and operate on a parsed [`Html`] document so
//! they can be unit tested against fixed fixtures and never hold a
//! non-`Send` DOM across an `.await`.

mod detail;
mod download_page;
mod login;

pub use detail::{DetailContent, DetailPageExtractor};
pub use download_page::{DownloadForm, DownloadFormExtractor, DownloadLinkExtractor};
pub use login::{LoginTokens, LoginPageExtractor, alert_message};

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors raised by extractors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A CSS selector failed to compile.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector {
        /// The selector source.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// A required element or attribute was not on the page.
    #[error("required element not found: {what}")]
    Missing {
        /// Description of the missing piece.
        what: &'static str,
    },
}

/// Pulls a typed value out of one kind of page.
pub trait PageExtractor {
    /// What the extractor produces.
    type Output;

    /// Runs the extraction rules against a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when a required element is absent.
    fn extract(&self, document: &Html) -> Result<Self::Output, ExtractError>;

    /// Parses `html` and runs [`extract`](Self::extract).
    ///
    /// # Errors
    ///
    /// Same as [`extract`](Self::extract).
    fn extract_str(&self, html: &str) -> Result<Self::Output, ExtractError> {
        self.extract(&Html::parse_document(html))
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Concatenation of the element's trimmed, non-empty text nodes.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// `value` attribute of the first `input[name=...]` under `scope`.
///
/// `Some("")` when the input exists without a value.
pub(crate) fn input_value(scope: ElementRef<'_>, name: &str) -> Result<Option<String>, ExtractError> {
    let css = format!("input[name=\"{name}\"]");
    let input_selector = selector(&css)?;
    Ok(scope
        .select(&input_selector)
        .next()
        .map(|input| input.value().attr("value").unwrap_or_default().to_string()))
}
