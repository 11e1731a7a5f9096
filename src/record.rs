//! Structured records produced by the crawler.
//!
//! One [`ContentRecord`] is written per JSON line in the output log. Optional
//! fields are omitted from the serialized form when absent, so records written
//! by older crawls (or by hand) read back without loss.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which ID space a record was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Video detail pages (`?videoid=N`).
    Video,
    /// Dataset pages (`?dataset=N`).
    Dataset,
}

impl ContentType {
    /// Stable lowercase label used in JSON and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Dataset => "dataset",
        }
    }
}

/// Detail page URL for `id`: `{base}?videoid={id}` or `{base}?dataset={id}`.
#[must_use]
pub fn content_url(base: &str, content_type: ContentType, id: u64) -> String {
    let key = match content_type {
        ContentType::Video => "videoid",
        ContentType::Dataset => "dataset",
    };
    format!("{base}?{key}={id}")
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hyperlink found inside the content area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// An embedded media element (`img`, `video` or `source`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Tag name of the element.
    #[serde(rename = "type")]
    pub kind: String,
    pub src: String,
}

/// One scraped detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Non-empty paragraph texts in document order.
    pub paragraphs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<Media>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    pub extracted_at: String,
    pub content_type: ContentType,
}

impl ContentRecord {
    /// A record is only worth keeping when at least one paragraph was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.paragraphs.is_empty()
    }
}
