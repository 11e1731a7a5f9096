//! Detail page (video or dataset) extraction.

use scraper::Html;
use tracing::debug;

use super::{ExtractError, PageExtractor, element_text, selector};
use crate::record::{Link, Media};

/// Root of the content area on detail pages.
pub const CONTENT_SELECTOR: &str = "body > div.main-container.container-fluid > div > div";

const MIN_CONTENT_CHARS: usize = 10;
const ERROR_MARKERS: [&str; 2] = ["Something went wrong", "Please go back and"];
const FILE_SIZE_LABEL: &str = "Size of upload video:";
const DOWNLOAD_BUTTON_PREFIX: &str = "Download ";

/// Fields scraped from a detail page, before id/url/timestamp are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailContent {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
    pub links: Option<Vec<Link>>,
    pub media: Option<Vec<Media>>,
    pub tables_count: Option<u32>,
    pub filename: Option<String>,
    pub file_size: Option<String>,
}

/// Extracts [`DetailContent`]; `None` means the page is empty for this id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetailPageExtractor;

impl PageExtractor for DetailPageExtractor {
    type Output = Option<DetailContent>;

    fn extract(&self, document: &Html) -> Result<Self::Output, ExtractError> {
        let root_selector = selector(CONTENT_SELECTOR)?;
        let Some(root) = document.select(&root_selector).next() else {
            debug!("content container not found");
            return Ok(None);
        };

        let text = element_text(root);
        if text.chars().count() < MIN_CONTENT_CHARS {
            return Ok(None);
        }
        if ERROR_MARKERS.iter().any(|marker| text.contains(marker)) {
            debug!("error page marker found");
            return Ok(None);
        }

        let p_selector = selector("p")?;
        let paragraphs: Vec<String> = root
            .select(&p_selector)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect();
        if paragraphs.is_empty() {
            return Ok(None);
        }

        let title = root
            .select(&selector("h1, h2, h3, h4, h5, h6")?)
            .map(element_text)
            .find(|t| !t.is_empty());

        let links: Vec<Link> = root
            .select(&selector("a[href]")?)
            .map(|a| Link {
                text: element_text(a),
                href: a.value().attr("href").unwrap_or_default().to_string(),
            })
            .collect();

        let tables = root.select(&selector("table")?).count();

        let media: Vec<Media> = root
            .select(&selector("img, video, source")?)
            .filter_map(|el| {
                el.value()
                    .attr("src")
                    .filter(|src| !src.is_empty())
                    .map(|src| Media {
                        kind: el.value().name().to_string(),
                        src: src.to_string(),
                    })
            })
            .collect();

        let strong_selector = selector("strong")?;
        let file_size = root
            .select(&p_selector)
            .find(|p| {
                p.select(&strong_selector)
                    .next()
                    .is_some_and(|s| s.text().collect::<String>().contains(FILE_SIZE_LABEL))
            })
            .map(|p| element_text(p).replace(FILE_SIZE_LABEL, "").trim().to_string())
            .filter(|size| !size.is_empty());

        let filename = root
            .select(&selector("button.btn")?)
            .map(element_text)
            .find(|t| t.starts_with(DOWNLOAD_BUTTON_PREFIX))
            .and_then(|t| {
                let name = t[DOWNLOAD_BUTTON_PREFIX.len()..].trim().to_string();
                (!name.is_empty()).then_some(name)
            });

        Ok(Some(DetailContent {
            title,
            paragraphs,
            links: (!links.is_empty()).then_some(links),
            media: (!media.is_empty()).then_some(media),
            tables_count: u32::try_from(tables).ok().filter(|n| *n > 0),
            filename,
            file_size,
        }))
    }
}
