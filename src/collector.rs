//! Item link collection on the section page
//!
//! The structured locator (`article h2 a`) is polled first; if it yields
//! nothing, every anchor whose `href` contains the section path is taken in
//! document order. Relative hrefs are resolved against the current URL.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::config::Config;
use crate::navigator::wait_for_elements;
use crate::session::{BrowserSession, ElementHandle, Locator};
use crate::utils::error::LinkCollectionError;

/// Structured item link on section pages
pub const ITEM_LINK_SELECTOR: &str = "article h2 a";

/// Which strategy produced the links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    Primary,
    AnchorScan,
}

/// Item URLs in page order, at most `target_count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedLinks {
    pub urls: Vec<String>,
    pub source: LinkSource,
}

/// Harvests item links from the current page
#[derive(Debug, Clone)]
pub struct LinkCollector {
    target_count: usize,
    section_path: String,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl LinkCollector {
    pub fn new(
        target_count: usize,
        section_path: &str,
        wait_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            target_count,
            section_path: section_path.to_lowercase(),
            wait_timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.scrape.target_count,
            &config.scrape.section_path,
            config.wait_timeout(),
            config.poll_interval(),
        )
    }

    /// Collect up to `target_count` item URLs from the section page
    pub async fn collect(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<CollectedLinks, LinkCollectionError> {
        if self.target_count == 0 {
            return Ok(CollectedLinks {
                urls: Vec::new(),
                source: LinkSource::Primary,
            });
        }

        let base = session.current_url().await.ok();

        let primary = wait_for_elements(
            session,
            &Locator::css(ITEM_LINK_SELECTOR),
            self.wait_timeout,
            self.poll_interval,
        )
        .await;
        let urls = self.take_hrefs(session, &primary, base.as_deref(), |_| true).await;
        if !urls.is_empty() {
            tracing::debug!(session_id = %session.id(), count = urls.len(), "Collected item links");
            return Ok(CollectedLinks {
                urls,
                source: LinkSource::Primary,
            });
        }

        tracing::debug!(session_id = %session.id(), "Structured item links missing, scanning anchors");
        let anchors = session.find_all(&Locator::tag("a")).await.unwrap_or_default();
        let urls = self
            .take_hrefs(session, &anchors, base.as_deref(), |href| {
                href.to_lowercase().contains(&self.section_path)
            })
            .await;

        if urls.is_empty() {
            return Err(LinkCollectionError::NoLinks(
                base.unwrap_or_else(|| String::from("<unknown>")),
            ));
        }

        tracing::debug!(session_id = %session.id(), count = urls.len(), "Collected item links by anchor scan");
        Ok(CollectedLinks {
            urls,
            source: LinkSource::AnchorScan,
        })
    }

    async fn take_hrefs<F>(
        &self,
        session: &dyn BrowserSession,
        elements: &[ElementHandle],
        base: Option<&str>,
        keep: F,
    ) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for element in elements {
            if urls.len() >= self.target_count {
                break;
            }

            let Ok(Some(href)) = session.attribute(element, "href").await else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() || !keep(href) {
                continue;
            }

            if let Some(url) = resolve_href(base, href) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }

        urls
    }
}

/// Resolve an `href` against the page URL; absolute hrefs pass through
pub fn resolve_href(base: Option<&str>, href: &str) -> Option<String> {
    if let Ok(url) = Url::parse(href) {
        return Some(url.to_string());
    }

    let base = Url::parse(base?).ok()?;
    base.join(href).ok().map(|url| url.to_string())
}
