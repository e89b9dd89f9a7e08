//! Common test utilities
//!
//! An in-memory browser that serves static HTML pages keyed by URL. Elements
//! under a `hidden` ancestor are not displayed until a button whose
//! `aria-controls` names that ancestor's id is clicked. Clicking an anchor
//! navigates to its `href`. XPath locators are unsupported.

#![allow(dead_code)]

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tribuna::config::Config;
use tribuna::models::EnvironmentSpec;
use tribuna::session::{BrowserSession, ElementHandle, Locator, SessionProvider, SessionStatus};
use tribuna::translate::Translator;
use tribuna::utils::error::{ProvisioningError, SessionError, TranslationError};

pub const BASE_URL: &str = "https://elpais.com/";
pub const SECTION_URL: &str = "https://elpais.com/opinion/";

/// Static pages served by one fake browser
#[derive(Debug, Clone, Default)]
pub struct Site {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    flaky: HashMap<String, usize>,
    panicking: HashSet<String>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Every load of `url` fails with a transport-like error
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// The first `times` loads of `url` fail
    pub fn flaky(mut self, url: &str, times: usize) -> Self {
        self.flaky.insert(url.to_string(), times);
        self
    }

    /// Loading `url` panics
    pub fn panicking(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }
}

/// What happened inside one fake session
#[derive(Debug, Clone, Default)]
pub struct BrowserLog {
    pub visited: Vec<String>,
    pub clicks: Vec<String>,
    pub statuses: Vec<(SessionStatus, String)>,
    pub quit_count: usize,
}

#[derive(Debug, Clone)]
struct ElementRecord {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    // `id` of every hidden ancestor-or-self (None when it has no id)
    hidden_by: Vec<Option<String>>,
}

#[derive(Debug, Default)]
struct PageState {
    current: Option<String>,
    elements: Vec<ElementRecord>,
    revealed: HashSet<String>,
    flaky: HashMap<String, usize>,
}

pub struct FakeBrowser {
    id: String,
    site: Site,
    state: Mutex<PageState>,
    log: Arc<Mutex<BrowserLog>>,
}

impl FakeBrowser {
    pub fn new(site: Site) -> Self {
        Self::with_log(site, Arc::new(Mutex::new(BrowserLog::default())))
    }

    fn with_log(site: Site, log: Arc<Mutex<BrowserLog>>) -> Self {
        let flaky = site.flaky.clone();
        Self {
            id: format!("fake-{}", uuid::Uuid::new_v4()),
            site,
            state: Mutex::new(PageState {
                flaky,
                ..PageState::default()
            }),
            log,
        }
    }

    pub fn log(&self) -> BrowserLog {
        self.log.lock().unwrap().clone()
    }

    fn load(&self, url: &str) -> Result<(), SessionError> {
        if self.site.panicking.contains(url) {
            panic!("renderer crashed on {url}");
        }

        self.log.lock().unwrap().visited.push(url.to_string());

        if self.site.failing.contains(url) {
            return Err(SessionError::Protocol(format!("HTTP 502: {url}")));
        }

        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.flaky.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SessionError::Protocol(format!("HTTP 503: {url}")));
            }
        }

        state.current = Some(url.to_string());
        state.elements.clear();
        state.revealed.clear();
        Ok(())
    }

    fn current_html(&self) -> String {
        let state = self.state.lock().unwrap();
        state
            .current
            .as_ref()
            .and_then(|url| self.site.pages.get(url))
            .cloned()
            .unwrap_or_else(|| String::from("<html><body></body></html>"))
    }

    fn element(&self, handle: &ElementHandle) -> Result<ElementRecord, SessionError> {
        let index: usize = handle
            .id()
            .trim_start_matches('e')
            .parse()
            .map_err(|_| SessionError::StaleElement(handle.id().to_string()))?;
        self.state
            .lock()
            .unwrap()
            .elements
            .get(index)
            .cloned()
            .ok_or_else(|| SessionError::StaleElement(handle.id().to_string()))
    }
}

fn record(element: ElementRef<'_>) -> ElementRecord {
    let value = element.value();
    let attrs = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let text = element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hidden_by = Vec::new();
    let mut node = Some(element);
    while let Some(current) = node {
        if current.value().attr("hidden").is_some() {
            hidden_by.push(current.value().attr("id").map(str::to_string));
        }
        node = current.parent().and_then(ElementRef::wrap);
    }

    ElementRecord {
        tag: value.name().to_string(),
        text,
        attrs,
        hidden_by,
    }
}

fn resolve(base: Option<&str>, href: &str) -> String {
    base.and_then(|base| url::Url::parse(base).ok())
        .and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.load(url)
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let state = self.state.lock().unwrap();
        Ok(state.current.clone().unwrap_or_else(|| String::from("about:blank")))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError> {
        let selector = match locator {
            Locator::Css(css) | Locator::TagName(css) => Selector::parse(css)
                .map_err(|_| SessionError::UnsupportedLocator(locator.to_string()))?,
            Locator::XPath(_) => return Err(SessionError::UnsupportedLocator(locator.to_string())),
        };

        let html = self.current_html();
        let records: Vec<ElementRecord> = {
            let document = Html::parse_document(&html);
            document.select(&selector).map(record).collect()
        };

        let mut state = self.state.lock().unwrap();
        let mut handles = Vec::with_capacity(records.len());
        for rec in records {
            handles.push(ElementHandle(format!("e{}", state.elements.len())));
            state.elements.push(rec);
        }
        Ok(handles)
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        let rec = self.element(element)?;
        let state = self.state.lock().unwrap();
        Ok(rec
            .hidden_by
            .iter()
            .all(|id| id.as_ref().is_some_and(|id| state.revealed.contains(id))))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError> {
        Ok(self.element(element)?.text)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.element(element)?.attrs.get(name).cloned())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        let rec = self.element(element)?;
        let label = if rec.text.is_empty() {
            rec.attrs.get("aria-label").cloned().unwrap_or_default()
        } else {
            rec.text.clone()
        };
        self.log.lock().unwrap().clicks.push(label);

        if let Some(target) = rec.attrs.get("aria-controls") {
            self.state.lock().unwrap().revealed.insert(target.clone());
        }

        if rec.tag == "a" {
            if let Some(href) = rec.attrs.get("href") {
                let current = self.state.lock().unwrap().current.clone();
                let url = resolve(current.as_deref(), href);
                self.load(&url)?;
            }
        }

        Ok(())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        Ok(self.current_html())
    }

    async fn set_status(&self, status: SessionStatus, reason: &str) -> Result<(), SessionError> {
        self.log
            .lock()
            .unwrap()
            .statuses
            .push((status, reason.to_string()));
        Ok(())
    }

    async fn quit(&self) -> Result<(), SessionError> {
        self.log.lock().unwrap().quit_count += 1;
        Ok(())
    }
}

/// Adds a fixed round-trip delay to every command of a fake browser
pub struct SlowBrowser {
    inner: FakeBrowser,
    delay: Duration,
}

impl SlowBrowser {
    pub fn new(inner: FakeBrowser, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn log(&self) -> BrowserLog {
        self.inner.log()
    }

    async fn round_trip(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

#[async_trait]
impl BrowserSession for SlowBrowser {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.round_trip().await;
        self.inner.goto(url).await
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.round_trip().await;
        self.inner.current_url().await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError> {
        self.round_trip().await;
        self.inner.find_all(locator).await
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        self.round_trip().await;
        self.inner.is_displayed(element).await
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError> {
        self.round_trip().await;
        self.inner.text(element).await
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        self.round_trip().await;
        self.inner.attribute(element, name).await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        self.round_trip().await;
        self.inner.click(element).await
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        self.round_trip().await;
        self.inner.page_source().await
    }

    async fn set_status(&self, status: SessionStatus, reason: &str) -> Result<(), SessionError> {
        self.round_trip().await;
        self.inner.set_status(status, reason).await
    }

    async fn quit(&self) -> Result<(), SessionError> {
        self.round_trip().await;
        self.inner.quit().await
    }
}

/// Hands out fake browsers per environment label
#[derive(Default)]
pub struct FakeProvider {
    sites: HashMap<String, Site>,
    refused: HashSet<String>,
    logs: Mutex<HashMap<String, Arc<Mutex<BrowserLog>>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site(mut self, label: &str, site: Site) -> Self {
        self.sites.insert(label.to_string(), site);
        self
    }

    /// Provisioning for `label` is rejected
    pub fn refusing(mut self, label: &str) -> Self {
        self.refused.insert(label.to_string());
        self
    }

    /// Log of the session created for `label`, if one was provisioned
    pub fn log(&self, label: &str) -> Option<BrowserLog> {
        self.logs
            .lock()
            .unwrap()
            .get(label)
            .map(|log| log.lock().unwrap().clone())
    }

    pub fn provisioned(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn create_session(
        &self,
        env: &EnvironmentSpec,
    ) -> Result<Box<dyn BrowserSession>, ProvisioningError> {
        if self.refused.contains(&env.label) {
            return Err(ProvisioningError::Auth(401));
        }

        let site = self.sites.get(&env.label).cloned().unwrap_or_default();
        let log = Arc::new(Mutex::new(BrowserLog::default()));
        self.logs
            .lock()
            .unwrap()
            .insert(env.label.clone(), Arc::clone(&log));

        Ok(Box::new(FakeBrowser::with_log(site, log)))
    }
}

/// Prefixes every text with "EN "
pub struct PrefixTranslator;

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        Ok(format!("EN {text}"))
    }
}

/// Always fails
pub struct DownTranslator;

#[async_trait]
impl Translator for DownTranslator {
    async fn translate(&self, _text: &str) -> Result<String, TranslationError> {
        Err(TranslationError::Status(503))
    }
}

/// Config with short waits for fake sessions
pub fn fast_config(target_count: usize) -> Config {
    let mut config = Config::default();
    config.scrape.target_count = target_count;
    config.scrape.wait_timeout_secs = 0;
    config.scrape.poll_interval_ms = 10;
    config.scrape.menu_settle_ms = 0;
    config.scrape.page_load_retries = 0;
    config
}

/// Desktop landing page: consent banner and a visible section link
pub fn desktop_landing() -> String {
    r#"<html><body>
        <div id="consent"><button>Aceptar y continuar</button></div>
        <nav><a href="/">Portada</a><a href="/opinion/">Opinión</a></nav>
    </body></html>"#
        .to_string()
}

/// Mobile landing page: section link inside a collapsed menu
pub fn mobile_landing() -> String {
    r#"<html><body>
        <header>
          <button class="menu-toggle" aria-controls="nav-menu">Menú</button>
          <div id="nav-menu" hidden>
            <a href="/internacional/">Internacional</a>
            <a href="/opinion/">Opinión</a>
          </div>
        </header>
    </body></html>"#
        .to_string()
}

/// Section page listing `urls` under the structured item locator
pub fn section_page(urls: &[String]) -> String {
    let items: String = urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!(r#"<article><h2><a href="{url}">Item {i}</a></h2></article>"#))
        .collect();
    format!("<html><body><main>{items}</main></body></html>")
}

/// Article page with title, two paragraphs and a share image
pub fn article_page(title: &str) -> String {
    format!(
        r#"<html><head><meta property="og:image" content="https://img.elpais.com/{slug}.jpg"></head>
        <body><h1>{title}</h1><article><p>Primer párrafo de {title}.</p><p>Segundo párrafo.</p></article></body></html>"#,
        slug = title.to_lowercase().replace(' ', "-"),
    )
}

/// Complete desktop site with one article per slug
pub fn desktop_site(slugs: &[&str]) -> Site {
    let urls: Vec<String> = slugs
        .iter()
        .map(|slug| format!("{SECTION_URL}{slug}.html"))
        .collect();

    let mut site = Site::new()
        .page(BASE_URL, &desktop_landing())
        .page(SECTION_URL, &section_page(&urls));
    for (slug, url) in slugs.iter().zip(&urls) {
        site = site.page(url, &article_page(&format!("Tribuna {slug}")));
    }
    site
}

pub fn env(label: &str) -> EnvironmentSpec {
    EnvironmentSpec::desktop("chrome", Some("latest"), "Windows", "11", label)
}
