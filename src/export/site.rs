//! Single-page static site over the video log.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::crawl::read_json_objects;

const TEMPLATE: &str = include_str!("site_template.html");
const COUNT_PLACEHOLDER: &str = "__VIDEO_COUNT__";
const DATA_PLACEHOLDER: &str = "__VIDEO_DATA__";

/// Errors raised by [`SiteGenerator`].
#[derive(Debug, Error)]
pub enum SiteError {
    /// The input log does not exist.
    #[error("input file not found: {path}")]
    NotFound {
        /// Input path.
        path: PathBuf,
    },

    /// The input log could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No usable records were found.
    #[error("no videos loaded from {path}, cannot generate site")]
    Empty {
        /// Input path.
        path: PathBuf,
    },

    /// The records could not be encoded for embedding.
    #[error("failed to encode video data: {0}")]
    Encode(#[source] serde_json::Error),

    /// The page could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Renders the video log as a searchable HTML table.
#[derive(Debug, Clone)]
pub struct SiteGenerator {
    input: PathBuf,
    output: PathBuf,
}

impl SiteGenerator {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Loads records, keeping the last one per id, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::NotFound`] or [`SiteError::Read`].
    pub fn load_videos(&self) -> Result<Vec<Map<String, Value>>, SiteError> {
        if !self.input.exists() {
            return Err(SiteError::NotFound {
                path: self.input.clone(),
            });
        }
        let objects = read_json_objects(&self.input).map_err(|source| SiteError::Read {
            path: self.input.clone(),
            source,
        })?;

        let mut by_id = BTreeMap::new();
        for object in objects {
            match object.get("id").and_then(Value::as_u64) {
                Some(id) => {
                    by_id.insert(id, object);
                }
                None => warn!("Skipping record without a numeric id"),
            }
        }
        info!(videos = by_id.len(), path = %self.input.display(), "Loaded videos");
        Ok(by_id.into_values().collect())
    }

    /// Writes the page, creating parent directories. Returns the record count.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] when the input is missing or empty or the write fails.
    #[instrument(skip(self), fields(input = %self.input.display(), output = %self.output.display()))]
    pub fn generate(&self) -> Result<usize, SiteError> {
        let videos = self.load_videos()?;
        if videos.is_empty() {
            return Err(SiteError::Empty {
                path: self.input.clone(),
            });
        }
        let html = generate_html(&videos)?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SiteError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.output, html.as_bytes()).map_err(|source| SiteError::Write {
            path: self.output.clone(),
            source,
        })?;

        info!(videos = videos.len(), bytes = html.len(), "Generated static site");
        Ok(videos.len())
    }
}

/// JSON for a `<script>` block, with `<` and `>` escaped.
///
/// # Errors
///
/// Returns [`SiteError::Encode`] if serialization fails.
pub fn escape_json(videos: &[Map<String, Value>]) -> Result<String, SiteError> {
    let json = serde_json::to_string(videos).map_err(SiteError::Encode)?;
    Ok(json.replace('<', "\\u003c").replace('>', "\\u003e"))
}

/// Full HTML page for `videos`.
///
/// # Errors
///
/// Returns [`SiteError::Encode`] if the records cannot be serialized.
pub fn generate_html(videos: &[Map<String, Value>]) -> Result<String, SiteError> {
    let data = escape_json(videos)?;
    Ok(TEMPLATE
        .replacen(COUNT_PLACEHOLDER, &videos.len().to_string(), 1)
        .replacen(DATA_PLACEHOLDER, &data, 1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video(id: u64, title: &str) -> Map<String, Value> {
        json!({"id": id, "title": title, "paragraphs": ["p"]})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_escape_json_hides_markup() {
        let escaped = escape_json(&[video(1, "</script><b>")]).unwrap();
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(escaped.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_generate_html_embeds_count_and_data() {
        let html = generate_html(&[video(1, "One"), video(2, "Two")]).unwrap();
        assert!(html.contains("<title>CDVL // VIDEO ARCHIVE</title>"));
        assert!(html.contains("2</span> videos loaded"));
        assert!(html.contains(r#"const videos = [{"id":1,"title":"One""#));
        assert!(!html.contains(COUNT_PLACEHOLDER));
        assert!(!html.contains(DATA_PLACEHOLDER));
    }

    #[test]
    fn test_generated_page_has_detail_view_and_copy_button() {
        let html = generate_html(&[video(3, "Three")]).unwrap();
        assert!(html.contains(r#"id="videoModal""#));
        assert!(html.contains("onclick=\"openModal(${video.id})\""));
        assert!(html.contains("addEventListener('hashchange', openFromHash)"));
        assert!(html.contains("e.key === 'Escape'"));
        assert!(html.contains("navigator.clipboard.writeText"));
    }
}
