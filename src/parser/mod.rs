//! Article extraction
//!
//! Item pages are parsed from a static DOM snapshot (`page_source`), so the
//! field extraction is a pure function of the HTML and never fails: a missing
//! heading, body or share image just leaves the field empty.

pub mod selectors;

pub use selectors::ArticleSelectors;

use scraper::Html;

use crate::models::Item;
use crate::session::BrowserSession;
use crate::utils::error::ExtractionError;
use crate::utils::normalize_whitespace;

/// Separator between body paragraphs
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Fields extracted from one article page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
}

impl ExtractedArticle {
    /// Turn the extracted fields into an item keyed by `url`
    pub fn into_item(self, url: &str) -> Item {
        let mut item = Item::new(url);
        item.title = self.title;
        item.body = self.body;
        item.image_url = self.image_url;
        item
    }
}

/// Extracts title, body and share image from article HTML
pub struct ArticleExtractor {
    selectors: ArticleSelectors,
}

impl ArticleExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: ArticleSelectors::new(),
        }
    }

    /// Extract article fields from raw HTML
    pub fn extract(&self, html: &str) -> ExtractedArticle {
        let document = Html::parse_document(html);

        ExtractedArticle {
            title: self.extract_title(&document),
            body: self.extract_body(&document),
            image_url: self.extract_image_url(&document),
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let heading = document.select(self.selectors.title).next()?;
        let title = normalize_whitespace(&heading.text().collect::<String>());
        (!title.is_empty()).then_some(title)
    }

    fn extract_body(&self, document: &Html) -> String {
        let Some(container) = document.select(self.selectors.container).next() else {
            return String::new();
        };

        container
            .select(self.selectors.paragraph)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }

    fn extract_image_url(&self, document: &Html) -> Option<String> {
        document
            .select(self.selectors.share_image)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    }

    /// Load `url` in the session and extract it into an item
    ///
    /// # Errors
    /// Returns `ExtractionError::Load` if the page load or snapshot fails.
    pub async fn extract_item(
        &self,
        session: &dyn BrowserSession,
        url: &str,
    ) -> Result<Item, ExtractionError> {
        let load_err = |source| ExtractionError::Load {
            url: url.to_string(),
            source,
        };

        session.goto(url).await.map_err(load_err)?;
        let html = session.page_source().await.map_err(load_err)?;

        let item = self.extract(&html).into_item(url);
        tracing::debug!(
            session_id = %session.id(),
            url = %url,
            has_title = item.title.is_some(),
            body_chars = item.body.chars().count(),
            "Extracted item"
        );
        Ok(item)
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}
