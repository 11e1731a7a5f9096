//! Download-manager form on the video page and the link table it returns.

use scraper::Html;

use super::{ExtractError, PageExtractor, element_text, input_value, selector};

const FORM_BUTTON_TEXT: &str = "download manager link";
const LINK_ROW_LABEL: &str = "Other";
const LINK_TOKEN_MARKER: &str = "GetFileDownload";

/// Fields posted to generate a download-manager link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadForm {
    pub video_id: String,
    pub distribution_type: String,
    pub verification_token: String,
    pub ufprt: Option<String>,
}

impl DownloadForm {
    /// Form body in posting order; `ufprt` only when non-empty.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("videoId", self.video_id.as_str()),
            ("distributionType", self.distribution_type.as_str()),
            ("__RequestVerificationToken", self.verification_token.as_str()),
        ];
        if let Some(ufprt) = self.ufprt.as_deref().filter(|v| !v.is_empty()) {
            fields.push(("ufprt", ufprt));
        }
        fields
    }
}

/// Finds the form whose button mentions a download manager link.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadFormExtractor;

impl PageExtractor for DownloadFormExtractor {
    type Output = DownloadForm;

    fn extract(&self, document: &Html) -> Result<Self::Output, ExtractError> {
        let form_selector = selector("form")?;
        let button_selector = selector("button")?;
        let form = document
            .select(&form_selector)
            .find(|form| {
                form.select(&button_selector).any(|button| {
                    element_text(button)
                        .to_lowercase()
                        .contains(FORM_BUTTON_TEXT)
                })
            })
            .ok_or(ExtractError::Missing {
                what: "download manager form",
            })?;

        let video_id = input_value(form, "videoId")?.ok_or(ExtractError::Missing {
            what: "videoId input",
        })?;
        let verification_token =
            input_value(form, "__RequestVerificationToken")?.ok_or(ExtractError::Missing {
                what: "__RequestVerificationToken input",
            })?;
        let distribution_type = input_value(form, "distributionType")?.unwrap_or_default();
        let ufprt = input_value(form, "ufprt")?.filter(|v| !v.is_empty());

        Ok(DownloadForm {
            video_id,
            distribution_type,
            verification_token,
            ufprt,
        })
    }
}

/// Reads the direct URL out of `table.downloadTable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadLinkExtractor;

impl PageExtractor for DownloadLinkExtractor {
    type Output = String;

    fn extract(&self, document: &Html) -> Result<Self::Output, ExtractError> {
        let table = document
            .select(&selector("table.downloadTable")?)
            .next()
            .ok_or(ExtractError::Missing {
                what: "table.downloadTable",
            })?;
        let row_selector = selector("tr")?;
        let cell_selector = selector("td")?;

        for row in table.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            if let [label, link, ..] = cells.as_slice()
                && label.text().collect::<String>().contains(LINK_ROW_LABEL)
            {
                let url = element_text(*link);
                if !url.is_empty() {
                    return Ok(url);
                }
            }
        }

        // Some rows carry the URL inside a wget/curl command line.
        table
            .select(&cell_selector)
            .flat_map(|cell| {
                cell.text()
                    .flat_map(str::split_whitespace)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .find(|token| token.contains(LINK_TOKEN_MARKER))
            .ok_or(ExtractError::Missing {
                what: "download URL in table.downloadTable",
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VIDEO_PAGE: &str = r#"
        <form action="/search"><button>Search</button></form>
        <form method="post">
            <input name="videoId" value="42">
            <input name="distributionType" value="1">
            <input name="__RequestVerificationToken" value="tok">
            <input name="ufprt" value="fp">
            <button type="submit">Generate a Download Manager Link</button>
        </form>"#;

    #[test]
    fn test_form_found_by_button_text() {
        let form = DownloadFormExtractor.extract_str(VIDEO_PAGE).unwrap();
        assert_eq!(form.video_id, "42");
        assert_eq!(form.distribution_type, "1");
        assert_eq!(form.verification_token, "tok");
        assert_eq!(form.ufprt.as_deref(), Some("fp"));
        assert_eq!(form.fields().len(), 4);
    }

    #[test]
    fn test_form_optional_fields_default() {
        let html = r#"<form>
            <input name="videoId" value="7">
            <input name="__RequestVerificationToken" value="tok">
            <button>download manager link</button></form>"#;
        let form = DownloadFormExtractor.extract_str(html).unwrap();
        assert_eq!(form.distribution_type, "");
        assert_eq!(form.ufprt, None);
        let names: Vec<_> = form.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["videoId", "distributionType", "__RequestVerificationToken"]);
    }

    #[test]
    fn test_form_missing_required_input() {
        let html = r#"<form><input name="videoId" value="7"><button>download manager link</button></form>"#;
        assert!(DownloadFormExtractor.extract_str(html).is_err());
    }

    #[test]
    fn test_no_matching_form() {
        let result = DownloadFormExtractor.extract_str("<form><button>Search</button></form>");
        assert!(matches!(
            result,
            Err(ExtractError::Missing {
                what: "download manager form"
            })
        ));
    }

    #[test]
    fn test_link_from_other_row() {
        let html = r#"<table class="downloadTable">
            <tr><td>wget</td><td>wget https://x/GetFileDownload?a=1</td></tr>
            <tr><td>Other</td><td> https://x/GetFileDownload?a=2 </td></tr>
        </table>"#;
        assert_eq!(
            DownloadLinkExtractor.extract_str(html).unwrap(),
            "https://x/GetFileDownload?a=2"
        );
    }

    #[test]
    fn test_link_fallback_token() {
        let html = r#"<table class="downloadTable">
            <tr><td>wget</td><td>wget -O out.bin https://x/GetFileDownload?a=1</td></tr>
        </table>"#;
        assert_eq!(
            DownloadLinkExtractor.extract_str(html).unwrap(),
            "https://x/GetFileDownload?a=1"
        );
    }

    #[test]
    fn test_link_table_missing() {
        assert!(DownloadLinkExtractor.extract_str("<p>nothing</p>").is_err());
    }
}
