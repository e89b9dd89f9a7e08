//! Configuration management for the tribuna scraper
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Credentials for the remote hub are always read
//! from the environment when the file leaves them empty.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::EnvironmentSpec;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote WebDriver hub
    pub hub: HubConfig,

    /// Navigation, collection and extraction settings
    pub scrape: ScrapeConfig,

    /// Title translation
    pub translation: TranslationConfig,

    /// Image download settings
    pub images: ImageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Run-level behavior
    pub run: RunConfig,

    /// Environment matrix, one session each
    pub environments: Vec<EnvironmentSpec>,
}

/// Remote hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// WebDriver endpoint URL
    pub url: String,

    /// Account identity (optional for local endpoints)
    pub username: Option<String>,

    /// Account secret (optional for local endpoints)
    pub access_key: Option<String>,

    /// Capability key the provider option block is sent under
    pub provider_options_key: String,

    /// Send out-of-band pass/fail status at the end of each session
    pub report_status: bool,

    /// Timeout for every protocol round trip, in seconds
    pub request_timeout_secs: u64,
}

/// What to do when one item page cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Fail the whole session, keeping items extracted so far
    AbortSession,
    /// Log the failure and continue with the next link
    SkipItem,
}

/// Scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Landing page URL
    pub base_url: String,

    /// Link texts identifying the section (any locale, matched case-insensitively)
    pub section_phrases: Vec<String>,

    /// URL path segment identifying section and item pages
    pub section_path: String,

    /// Button texts identifying a consent dialog's accept control
    pub consent_phrases: Vec<String>,

    /// Try to dismiss the consent dialog
    pub dismiss_consent: bool,

    /// Maximum number of items per session and in the aggregate
    pub target_count: usize,

    /// Upper bound for element polling, in seconds
    pub wait_timeout_secs: u64,

    /// Interval between element polls, in milliseconds
    pub poll_interval_ms: u64,

    /// Pause after clicking a menu toggle, in milliseconds
    pub menu_settle_ms: u64,

    /// Extra attempts for the landing page load
    pub page_load_retries: u32,

    /// Behavior when an item page is unreachable
    pub extraction_policy: ExtractionPolicy,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translate titles at all
    pub enabled: bool,

    /// Translation endpoint URL
    pub endpoint: String,

    /// Source language code
    pub source: String,

    /// Target language code
    pub target: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Image download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Output directory
    pub dir: PathBuf,

    /// File name prefix (`{prefix}_{index}.{ext}`)
    pub prefix: String,

    /// Download timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

/// Exit status policy for the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Always exit successfully; failures only appear in the summary
    AlwaysSuccess,
    /// Exit with failure if any session failed
    FailOnAnySession,
    /// Exit with failure only if every session failed
    FailOnAllSessions,
}

impl ExitPolicy {
    /// Decide whether the run counts as failed
    #[must_use]
    pub fn is_failure(&self, passed: usize, failed: usize) -> bool {
        match self {
            Self::AlwaysSuccess => false,
            Self::FailOnAnySession => failed > 0,
            Self::FailOnAllSessions => passed == 0,
        }
    }
}

/// Run-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub exit_policy: ExitPolicy,

    /// Minimum occurrences for a word to appear in the frequency report
    pub min_word_count: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: String::from("https://hub.browserstack.com/wd/hub"),
            username: None,
            access_key: None,
            provider_options_key: String::from("bstack:options"),
            report_status: true,
            request_timeout_secs: 90,
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://elpais.com/"),
            section_phrases: vec![String::from("opinión"), String::from("opinion")],
            section_path: String::from("/opinion/"),
            consent_phrases: vec![String::from("accept"), String::from("acept")],
            dismiss_consent: true,
            target_count: 5,
            wait_timeout_secs: 12,
            poll_interval_ms: 500,
            menu_settle_ms: 1000,
            page_load_retries: 2,
            extraction_policy: ExtractionPolicy::AbortSession,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::from("https://translate.googleapis.com/translate_a/single"),
            source: String::from("es"),
            target: String::from("en"),
            timeout_secs: 15,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("article_images"),
            prefix: String::from("article"),
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            exit_policy: ExitPolicy::AlwaysSuccess,
            min_word_count: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: HubConfig::default(),
            scrape: ScrapeConfig::default(),
            translation: TranslationConfig::default(),
            images: ImageConfig::default(),
            logging: LoggingConfig::default(),
            run: RunConfig::default(),
            environments: default_environments(),
        }
    }
}

/// Default five-way matrix: three desktop browsers and two real devices
pub fn default_environments() -> Vec<EnvironmentSpec> {
    vec![
        EnvironmentSpec::desktop("chrome", Some("latest"), "Windows", "11", "Chrome Test"),
        EnvironmentSpec::desktop("firefox", Some("latest"), "Windows", "11", "Firefox Test"),
        EnvironmentSpec::desktop("edge", Some("latest"), "Windows", "11", "Edge Test"),
        EnvironmentSpec::device("chrome", "Samsung Galaxy S22", "12", None, "Android Chrome Test"),
        EnvironmentSpec::device(
            "chrome",
            "iPhone 14",
            "16",
            Some("iOS"),
            "iPhone 14 Chrome Test",
        ),
    ]
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file, then fill credentials from the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(username) = std::env::var("BROWSERSTACK_USERNAME") {
            if self.hub.username.as_deref().map_or(true, str::is_empty) {
                self.hub.username = Some(username);
            }
        }

        if let Ok(key) = std::env::var("BROWSERSTACK_ACCESS_KEY") {
            if self.hub.access_key.as_deref().map_or(true, str::is_empty) {
                self.hub.access_key = Some(key);
            }
        }

        if let Ok(url) = std::env::var("TRIBUNA_HUB_URL") {
            self.hub.url = url;
        }

        if let Some(count) = std::env::var("TRIBUNA_TARGET_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            self.scrape.target_count = count;
        }

        if let Some(secs) = std::env::var("TRIBUNA_WAIT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.scrape.wait_timeout_secs = secs;
        }

        if let Ok(dir) = std::env::var("TRIBUNA_IMAGE_DIR") {
            self.images.dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("TRIBUNA_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("TRIBUNA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.hub.url).context("hub.url is not a valid URL")?;
        url::Url::parse(&self.scrape.base_url).context("scrape.base_url is not a valid URL")?;

        if self.scrape.section_phrases.is_empty() {
            anyhow::bail!("scrape.section_phrases must not be empty");
        }

        if self.scrape.section_path.is_empty() {
            anyhow::bail!("scrape.section_path must not be empty");
        }

        if self.scrape.poll_interval_ms == 0 {
            anyhow::bail!("scrape.poll_interval_ms must be greater than 0");
        }

        if self.hub.request_timeout_secs == 0 {
            anyhow::bail!("hub.request_timeout_secs must be greater than 0");
        }

        if self.images.prefix.is_empty() {
            anyhow::bail!("images.prefix must not be empty");
        }

        let mut labels = std::collections::HashSet::new();
        for env in &self.environments {
            if !labels.insert(env.label.as_str()) {
                anyhow::bail!("duplicate environment label: {}", env.label);
            }
        }

        Ok(())
    }

    /// Whether credentials for the hub are present
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.hub.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.hub.access_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape.wait_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scrape.poll_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hub.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.environments.len(), 5);
        assert_eq!(config.scrape.target_count, 5);
    }

    #[test]
    fn test_invalid_poll_interval() {
        let mut config = Config::default();
        config.scrape.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let mut config = Config::default();
        let first = config.environments[0].clone();
        config.environments.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.wait_timeout(), Duration::from_secs(12));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_exit_policy() {
        assert!(!ExitPolicy::AlwaysSuccess.is_failure(0, 5));
        assert!(ExitPolicy::FailOnAnySession.is_failure(4, 1));
        assert!(!ExitPolicy::FailOnAnySession.is_failure(5, 0));
        assert!(ExitPolicy::FailOnAllSessions.is_failure(0, 5));
        assert!(!ExitPolicy::FailOnAllSessions.is_failure(1, 4));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scrape]
            target_count = 3
            extraction_policy = "skip_item"

            [run]
            exit_policy = "fail_on_all_sessions"
            "#,
        )
        .unwrap();

        assert_eq!(config.scrape.target_count, 3);
        assert_eq!(config.scrape.extraction_policy, ExtractionPolicy::SkipItem);
        assert_eq!(config.run.exit_policy, ExitPolicy::FailOnAllSessions);
        assert_eq!(config.scrape.base_url, "https://elpais.com/");
        assert_eq!(config.environments.len(), 5);
    }
}
