// Core data structures for the tribuna scraper

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// One browser/device configuration a session runs against
///
/// Field names on the wire follow the environment descriptor
/// (`browserName`, `providerOptions`, `sessionLabel`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    pub browser_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,

    pub provider_options: ProviderOptions,

    #[serde(rename = "sessionLabel", alias = "label")]
    pub label: String,

    /// Additional flat capability keys copied as-is into the session request
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl EnvironmentSpec {
    /// Desktop environment (browser on an operating system)
    pub fn desktop(browser: &str, version: Option<&str>, os: &str, os_version: &str, label: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("sessionName".to_string(), Value::String(label.to_string()));

        Self {
            browser_name: browser.to_string(),
            browser_version: version.map(str::to_string),
            provider_options: ProviderOptions::Desktop {
                os: os.to_string(),
                os_version: os_version.to_string(),
                extra,
            },
            label: label.to_string(),
            extra: Map::new(),
        }
    }

    /// Real-device environment (browser on a phone or tablet)
    pub fn device(
        browser: &str,
        device_name: &str,
        os_version: &str,
        platform_name: Option<&str>,
        label: &str,
    ) -> Self {
        let mut extra = Map::new();
        extra.insert("sessionName".to_string(), Value::String(label.to_string()));

        Self {
            browser_name: browser.to_string(),
            browser_version: None,
            provider_options: ProviderOptions::Device {
                device_name: device_name.to_string(),
                os_version: os_version.to_string(),
                platform_name: platform_name.map(str::to_string),
                real_mobile: "true".to_string(),
                extra,
            },
            label: label.to_string(),
            extra: Map::new(),
        }
    }

    /// Whether this environment targets a mobile device
    pub fn is_mobile(&self) -> bool {
        matches!(self.provider_options, ProviderOptions::Device { .. })
    }
}

/// Provider-specific option block, forwarded verbatim to the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderOptions {
    #[serde(rename_all = "camelCase")]
    Desktop {
        os: String,
        os_version: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    Device {
        device_name: String,
        os_version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform_name: Option<String>,
        real_mobile: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

/// Outcome of a best-effort step that must never fail its caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    #[default]
    NotAttempted,
    FailedNonFatal(String),
    Succeeded,
}

impl StepOutcome {
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::FailedNonFatal(reason.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttempted => write!(f, "not attempted"),
            Self::FailedNonFatal(reason) => write!(f, "failed ({reason})"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}

/// Scraped article record, keyed by URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    url: String,
    /// Source-language title (first heading)
    pub title: Option<String>,
    /// Source-language body, paragraphs separated by blank lines
    pub body: String,
    /// Translated title, empty when translation failed or was skipped
    pub translated_title: String,
    pub translation: StepOutcome,
    pub image_url: Option<String>,
    pub image_path: Option<PathBuf>,
}

impl Item {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Identity key; fixed at construction
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// How a session reached the target section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPath {
    Desktop,
    MobileMenu,
    AnchorScan,
}

impl NavigationPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::MobileMenu => "mobile-menu",
            Self::AnchorScan => "anchor-scan",
        }
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one session, produced exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub label: String,
    pub success: bool,
    pub items: Vec<Item>,
    pub error: Option<String>,
    pub consent: StepOutcome,
    pub navigation_path: Option<NavigationPath>,
}

impl SessionResult {
    pub fn passed(label: &str, items: Vec<Item>) -> Self {
        Self {
            label: label.to_string(),
            success: true,
            items,
            error: None,
            consent: StepOutcome::NotAttempted,
            navigation_path: None,
        }
    }

    pub fn failed(label: &str, items: Vec<Item>, error: impl fmt::Display) -> Self {
        Self {
            label: label.to_string(),
            success: false,
            items,
            error: Some(error.to_string()),
            consent: StepOutcome::NotAttempted,
            navigation_path: None,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            label: self.label.clone(),
            passed: self.success,
            error: self.error.clone(),
            item_count: self.items.len(),
        }
    }
}

/// Pass/fail line for one session in the final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub label: String,
    pub passed: bool,
    pub error: Option<String>,
    pub item_count: usize,
}

/// Deduplicated, size-capped merge of all sessions' items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub run_id: uuid::Uuid,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<Item>,
    pub sessions: Vec<SessionSummary>,
}

impl AggregateReport {
    pub fn passed_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.passed).count()
    }

    pub fn failed_sessions(&self) -> usize {
        self.sessions.len() - self.passed_sessions()
    }
}

/// Token frequency across translated titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}
