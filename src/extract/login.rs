//! Login page tokens and error banners.

use scraper::Html;

use super::{ExtractError, PageExtractor, element_text, input_value, selector};

/// Hidden CSRF inputs required to post the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub verification_token: String,
    /// Fingerprint token; `None` when absent or empty.
    pub ufprt: Option<String>,
}

/// Extracts [`LoginTokens`] from the login page.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginPageExtractor;

impl PageExtractor for LoginPageExtractor {
    type Output = LoginTokens;

    fn extract(&self, document: &Html) -> Result<Self::Output, ExtractError> {
        let root = document.root_element();
        let verification_token = input_value(root, "__RequestVerificationToken")?.ok_or(
            ExtractError::Missing {
                what: "__RequestVerificationToken",
            },
        )?;
        let ufprt = input_value(root, "ufprt")?.filter(|v| !v.is_empty());
        Ok(LoginTokens {
            verification_token,
            ufprt,
        })
    }
}

/// Text of the first `div.alert-danger`, if the page shows one.
#[must_use]
pub fn alert_message(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let alert = selector("div.alert-danger").ok()?;
    document
        .select(&alert)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_both_tokens() {
        let html = r#"<form>
            <input type="hidden" name="__RequestVerificationToken" value="csrf-123">
            <input type="hidden" name="ufprt" value="fp-456">
        </form>"#;
        let tokens = LoginPageExtractor.extract_str(html).unwrap();
        assert_eq!(tokens.verification_token, "csrf-123");
        assert_eq!(tokens.ufprt.as_deref(), Some("fp-456"));
    }

    #[test]
    fn test_ufprt_is_optional() {
        let html = r#"<input name="__RequestVerificationToken" value="csrf"><input name="ufprt" value="">"#;
        let tokens = LoginPageExtractor.extract_str(html).unwrap();
        assert_eq!(tokens.ufprt, None);
    }

    #[test]
    fn test_missing_verification_token_fails() {
        let result = LoginPageExtractor.extract_str("<form><input name=\"ufprt\" value=\"x\"></form>");
        assert!(matches!(
            result,
            Err(ExtractError::Missing {
                what: "__RequestVerificationToken"
            })
        ));
    }

    #[test]
    fn test_alert_message() {
        let html = r#"<div class="alert alert-danger"> Invalid username or password </div>"#;
        assert_eq!(
            alert_message(html).as_deref(),
            Some("Invalid username or password")
        );
        assert_eq!(alert_message("<p>fine</p>"), None);
    }
}
