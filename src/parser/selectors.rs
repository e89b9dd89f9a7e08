//! CSS selectors for article pages
//!
//! Parsed once on first use and shared by every extractor.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref TITLE: Selector = parse_selector!("h1");
    static ref CONTAINER: Selector = parse_selector!("article");
    static ref PARAGRAPH: Selector = parse_selector!("p");
    static ref SHARE_IMAGE: Selector = parse_selector!(r#"meta[property="og:image"]"#);
}

/// Selectors for a single article page
pub struct ArticleSelectors {
    /// First heading, taken as the title
    pub title: &'static Selector,
    /// Body container
    pub container: &'static Selector,
    /// Body paragraphs inside the container
    pub paragraph: &'static Selector,
    /// Social share image (`content` attribute)
    pub share_image: &'static Selector,
}

impl ArticleSelectors {
    pub fn new() -> Self {
        Self {
            title: &TITLE,
            container: &CONTAINER,
            paragraph: &PARAGRAPH,
            share_image: &SHARE_IMAGE,
        }
    }
}

impl Default for ArticleSelectors {
    fn default() -> Self {
        Self::new()
    }
}
