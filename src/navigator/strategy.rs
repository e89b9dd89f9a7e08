//! Locate strategies and fallback chains
//!
//! Each strategy answers one question ("is there an element like this?") and
//! returns [`Located::Found`] or [`Located::NotFound`]. Strategies never fail:
//! a session error inside a strategy means "not found" for that strategy, and
//! the chain moves on to the next one.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::session::{BrowserSession, ElementHandle, Locator};
use crate::utils::contains_any_phrase;

/// Tagged result of a single locate attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(ElementHandle),
    NotFound,
}

/// One way of finding an element on the current page
#[async_trait]
pub trait Locate: Send + Sync {
    /// Name used in logs and error traces
    fn name(&self) -> &str;

    /// One full attempt on the current page
    async fn locate(&self, session: &dyn BrowserSession) -> Located {
        self.locate_until(session, None).await
    }

    /// One attempt that gives up once `deadline` has passed
    ///
    /// Strategies that make one round trip per element check the deadline
    /// between elements, so a single scan cannot outlive the wait budget.
    async fn locate_until(&self, session: &dyn BrowserSession, deadline: Option<Instant>) -> Located;
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// First element matching a W3C locator
pub struct ByLocator {
    name: String,
    locator: Locator,
    visible_only: bool,
}

impl ByLocator {
    pub fn new(name: &str, locator: Locator) -> Self {
        Self {
            name: name.to_string(),
            locator,
            visible_only: true,
        }
    }

    pub fn any_visibility(mut self) -> Self {
        self.visible_only = false;
        self
    }
}

#[async_trait]
impl Locate for ByLocator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn locate_until(&self, session: &dyn BrowserSession, deadline: Option<Instant>) -> Located {
        let elements = match session.find_all(&self.locator).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!(strategy = %self.name, locator = %self.locator, error = %e, "Locator failed");
                return Located::NotFound;
            }
        };

        for element in elements {
            if !self.visible_only {
                return Located::Found(element);
            }
            if expired(deadline) {
                break;
            }
            if session.is_displayed(&element).await.unwrap_or(false) {
                return Located::Found(element);
            }
        }

        Located::NotFound
    }
}

/// Scan elements and match their text (or `aria-label`) against phrases
pub struct ByText {
    name: String,
    locator: Locator,
    phrases: Vec<String>,
    visible_only: bool,
}

impl ByText {
    pub fn new(name: &str, locator: Locator, phrases: &[String]) -> Self {
        Self {
            name: name.to_string(),
            locator,
            phrases: phrases.to_vec(),
            visible_only: true,
        }
    }
}

/// Visible text of an element, falling back to its `aria-label`
async fn label_of(session: &dyn BrowserSession, element: &ElementHandle) -> String {
    let text = session.text(element).await.unwrap_or_default();
    if !text.trim().is_empty() {
        return text;
    }

    session
        .attribute(element, "aria-label")
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[async_trait]
impl Locate for ByText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn locate_until(&self, session: &dyn BrowserSession, deadline: Option<Instant>) -> Located {
        let elements = match session.find_all(&self.locator).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!(strategy = %self.name, error = %e, "Text scan failed");
                return Located::NotFound;
            }
        };

        for element in elements {
            if expired(deadline) {
                tracing::debug!(strategy = %self.name, "Text scan cut off at deadline");
                break;
            }

            let label = label_of(session, &element).await;
            if !contains_any_phrase(&label, &self.phrases) {
                continue;
            }

            if !self.visible_only || session.is_displayed(&element).await.unwrap_or(false) {
                return Located::Found(element);
            }
        }

        Located::NotFound
    }
}

/// Exhaustive anchor scan: text phrase or `href` path segment, any visibility
pub struct ByTextOrHref {
    name: String,
    phrases: Vec<String>,
    path_segment: String,
}

impl ByTextOrHref {
    pub fn new(name: &str, phrases: &[String], path_segment: &str) -> Self {
        Self {
            name: name.to_string(),
            phrases: phrases.to_vec(),
            path_segment: path_segment.to_lowercase(),
        }
    }
}

#[async_trait]
impl Locate for ByTextOrHref {
    fn name(&self) -> &str {
        &self.name
    }

    async fn locate_until(&self, session: &dyn BrowserSession, deadline: Option<Instant>) -> Located {
        let anchors = match session.find_all(&Locator::tag("a")).await {
            Ok(anchors) => anchors,
            Err(e) => {
                tracing::debug!(strategy = %self.name, error = %e, "Anchor scan failed");
                return Located::NotFound;
            }
        };

        for anchor in anchors {
            if expired(deadline) {
                break;
            }

            let text = session.text(&anchor).await.unwrap_or_default();
            if contains_any_phrase(&text, &self.phrases) {
                return Located::Found(anchor);
            }

            let href = session
                .attribute(&anchor, "href")
                .await
                .ok()
                .flatten()
                .unwrap_or_default()
                .to_lowercase();
            if href.contains(&self.path_segment) {
                return Located::Found(anchor);
            }
        }

        Located::NotFound
    }
}

/// Retry an inner strategy at a fixed interval until a deadline
///
/// The deadline also bounds each attempt. A zero timeout means one full
/// attempt with no waiting.
pub struct Polling<L> {
    inner: L,
    timeout: Duration,
    interval: Duration,
}

impl<L: Locate> Polling<L> {
    pub fn new(inner: L, timeout: Duration, interval: Duration) -> Self {
        Self {
            inner,
            timeout,
            interval,
        }
    }
}

#[async_trait]
impl<L: Locate> Locate for Polling<L> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn locate_until(&self, session: &dyn BrowserSession, deadline: Option<Instant>) -> Located {
        if self.timeout.is_zero() {
            return self.inner.locate_until(session, deadline).await;
        }

        let own = Instant::now() + self.timeout;
        let deadline = deadline.map_or(own, |outer| outer.min(own));

        loop {
            if let found @ Located::Found(_) = self.inner.locate_until(session, Some(deadline)).await {
                return found;
            }

            if Instant::now() + self.interval > deadline {
                tracing::debug!(strategy = %self.name(), timeout_ms = self.timeout.as_millis(), "Polling timed out");
                return Located::NotFound;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Ordered strategies, tried until one finds an element
#[derive(Default)]
pub struct FallbackChain {
    strategies: Vec<Box<dyn Locate>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, strategy: impl Locate + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First match in priority order, with the name of the strategy that found it
    pub async fn first_match(&self, session: &dyn BrowserSession) -> Option<(String, ElementHandle)> {
        for strategy in &self.strategies {
            if let Located::Found(element) = strategy.locate(session).await {
                tracing::debug!(strategy = %strategy.name(), "Strategy matched");
                return Some((strategy.name().to_string(), element));
            }
        }
        None
    }
}

/// Poll until the locator matches at least one element, or the timeout elapses
///
/// Returns an empty list on timeout or when every attempt errors.
pub async fn wait_for_elements(
    session: &dyn BrowserSession,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Vec<ElementHandle> {
    let deadline = Instant::now() + timeout;

    loop {
        match session.find_all(locator).await {
            Ok(elements) if !elements.is_empty() => return elements,
            Ok(_) => {}
            Err(e) => tracing::debug!(locator = %locator, error = %e, "Element lookup failed"),
        }
        if Instant::now() + interval > deadline {
            return Vec::new();
        }
        tokio::time::sleep(interval).await;
    }
}
