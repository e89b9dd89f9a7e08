//! Navigation from the landing page to the target section
//!
//! The engine moves through `Start → CookieDismissed → SectionLocated` and
//! ends in success or [`NavigationError`]. Page layouts differ by device class
//! and locale, so every step is a [`FallbackChain`] tried in decreasing order
//! of specificity instead of a branch per device:
//!
//! 1. consent dialog: locale phrase matches, then a generic button scan
//!    (best-effort, never fatal)
//! 2. section link: desktop link under a bounded wait, then a revealed mobile
//!    menu, then an exhaustive anchor scan

pub mod strategy;

use std::time::Duration;

use crate::config::Config;
use crate::models::{NavigationPath, StepOutcome};
use crate::session::{BrowserSession, Locator};
use crate::utils::error::NavigationError;
use crate::utils::retry::{with_retry_if, RetryConfig};

pub use strategy::{
    wait_for_elements, ByLocator, ByText, ByTextOrHref, FallbackChain, Locate, Located, Polling,
};

/// Pause after a consent click so the dialog can close
const CONSENT_SETTLE: Duration = Duration::from_millis(300);

const STAGE_DESKTOP: &str = "desktop-link";
const STAGE_MOBILE: &str = "mobile-menu";
const STAGE_SCAN: &str = "anchor-scan";

/// Settings for one navigation run
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub base_url: String,
    pub section_phrases: Vec<String>,
    pub section_path: String,
    pub consent_phrases: Vec<String>,
    pub dismiss_consent: bool,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub menu_settle: Duration,
    pub retry: RetryConfig,
}

impl NavigatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.scrape.base_url.clone(),
            section_phrases: config.scrape.section_phrases.clone(),
            section_path: config.scrape.section_path.clone(),
            consent_phrases: config.scrape.consent_phrases.clone(),
            dismiss_consent: config.scrape.dismiss_consent,
            wait_timeout: config.wait_timeout(),
            poll_interval: config.poll_interval(),
            menu_settle: Duration::from_millis(config.scrape.menu_settle_ms),
            retry: RetryConfig::new(config.scrape.page_load_retries),
        }
    }
}

/// Where navigation ended up and how it got there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub consent: StepOutcome,
    pub path: NavigationPath,
}

/// Drives a session from the landing page to the section page
pub struct Navigator {
    config: NavigatorConfig,
    consent: FallbackChain,
    desktop: FallbackChain,
    toggles: FallbackChain,
    menu_link: FallbackChain,
    anchor_scan: FallbackChain,
}

impl Navigator {
    pub fn new(config: NavigatorConfig) -> Self {
        let consent = FallbackChain::new()
            .then(ByLocator::new(
                "consent-accept-text",
                Locator::xpath(
                    "//button[contains(translate(normalize-space(.),\
                     'ABCDEFGHIJKLMNOPQRSTUVWXYZ','abcdefghijklmnopqrstuvwxyz'),'accept')]",
                ),
            ))
            .then(ByLocator::new(
                "consent-aceptar-text",
                Locator::xpath("//button[contains(., 'Aceptar')]"),
            ))
            .then(ByLocator::new(
                "consent-aria-label",
                Locator::css("button[aria-label*='accept'], button[aria-label*='Aceptar']"),
            ))
            .then(ByText::new(
                "consent-button-scan",
                Locator::tag("button"),
                &config.consent_phrases,
            ));

        let desktop = FallbackChain::new().then(Polling::new(
            ByText::new(STAGE_DESKTOP, Locator::tag("a"), &config.section_phrases),
            config.wait_timeout,
            config.poll_interval,
        ));

        let toggles = FallbackChain::new()
            .then(ByLocator::new(
                "menu-toggle-aria",
                Locator::xpath("//button[contains(@aria-label,'Menu') or contains(@aria-label,'Menú')]"),
            ))
            .then(ByLocator::new(
                "menu-toggle-class",
                Locator::css(".hamburger, button.menu, .menu-toggle"),
            ));

        let menu_link = FallbackChain::new().then(ByText::new(
            "menu-section-link",
            Locator::tag("a"),
            &config.section_phrases,
        ));

        let anchor_scan = FallbackChain::new().then(ByTextOrHref::new(
            STAGE_SCAN,
            &config.section_phrases,
            &config.section_path,
        ));

        Self {
            config,
            consent,
            desktop,
            toggles,
            menu_link,
            anchor_scan,
        }
    }

    /// Load the landing page, dismiss consent, and open the section
    pub async fn run(&self, session: &dyn BrowserSession) -> Result<Navigation, NavigationError> {
        self.load_landing(session).await?;
        tracing::debug!(session_id = %session.id(), state = "start", "Landing page loaded");

        let consent = self.dismiss_consent(session).await;
        tracing::debug!(session_id = %session.id(), state = "cookie_dismissed", consent = %consent, "Consent step finished");

        let path = self.locate_section(session).await?;
        tracing::info!(session_id = %session.id(), state = "section_located", path = %path, "Reached section");

        Ok(Navigation { consent, path })
    }

    /// Load the landing page, retrying transient failures
    pub async fn load_landing(&self, session: &dyn BrowserSession) -> Result<(), NavigationError> {
        let url = self.config.base_url.as_str();
        with_retry_if(&self.config.retry, || session.goto(url), |e| e.is_transient())
            .await
            .map_err(|e| NavigationError::LandingUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Click the first visible consent control; never fails the caller
    pub async fn dismiss_consent(&self, session: &dyn BrowserSession) -> StepOutcome {
        if !self.config.dismiss_consent {
            return StepOutcome::NotAttempted;
        }

        let Some((strategy, button)) = self.consent.first_match(session).await else {
            tracing::debug!(session_id = %session.id(), "No consent dialog found");
            return StepOutcome::failed("no consent control found");
        };

        match session.click(&button).await {
            Ok(()) => {
                tracing::debug!(session_id = %session.id(), strategy = %strategy, "Consent dismissed");
                tokio::time::sleep(CONSENT_SETTLE).await;
                StepOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id(), strategy = %strategy, error = %e, "Consent click failed");
                StepOutcome::failed(e)
            }
        }
    }

    /// Find and click the section link, trying each stage in order
    pub async fn locate_section(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<NavigationPath, NavigationError> {
        let mut attempted = Vec::new();

        attempted.push(STAGE_DESKTOP.to_string());
        if self.click_first(session, &self.desktop).await {
            return Ok(NavigationPath::Desktop);
        }

        attempted.push(STAGE_MOBILE.to_string());
        if self.reveal_menu(session).await && self.click_first(session, &self.menu_link).await {
            return Ok(NavigationPath::MobileMenu);
        }

        attempted.push(STAGE_SCAN.to_string());
        if self.click_first(session, &self.anchor_scan).await {
            return Ok(NavigationPath::AnchorScan);
        }

        tracing::warn!(session_id = %session.id(), attempted = ?attempted, "Section link not found");
        Err(NavigationError::SectionNotFound { attempted })
    }

    /// Click the first visible menu toggle; true if the menu stage should look for the link
    async fn reveal_menu(&self, session: &dyn BrowserSession) -> bool {
        match self.toggles.first_match(session).await {
            Some((strategy, toggle)) => match session.click(&toggle).await {
                Ok(()) => {
                    tracing::debug!(session_id = %session.id(), strategy = %strategy, "Menu toggle clicked");
                    tokio::time::sleep(self.config.menu_settle).await;
                    true
                }
                Err(e) => {
                    tracing::debug!(session_id = %session.id(), error = %e, "Menu toggle click failed");
                    false
                }
            },
            // The menu may already be open on some layouts
            None => true,
        }
    }

    async fn click_first(&self, session: &dyn BrowserSession, chain: &FallbackChain) -> bool {
        let Some((strategy, link)) = chain.first_match(session).await else {
            return false;
        };

        match session.click(&link).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(session_id = %session.id(), strategy = %strategy, error = %e, "Section link click failed");
                false
            }
        }
    }
}
