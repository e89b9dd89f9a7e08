//! Capability building for remote sessions
//!
//! A driver-configuration transform is chosen by normalized browser name and
//! seeds the driver defaults. Flat capability keys from the environment are
//! copied over the defaults as-is, and the provider option block is attached
//! verbatim under its configured key.

use serde_json::{json, Map, Value};

use crate::models::EnvironmentSpec;

/// Driver family selected for an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
}

impl BrowserKind {
    /// Normalize a browser name; unrecognized names use the chrome transform
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "firefox" => Self::Firefox,
            "edge" | "microsoftedge" => Self::Edge,
            _ => Self::Chrome,
        }
    }

    fn default_browser_name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Edge => "MicrosoftEdge",
        }
    }

    fn vendor_options_key(&self) -> &'static str {
        match self {
            Self::Chrome => "goog:chromeOptions",
            Self::Firefox => "moz:firefoxOptions",
            Self::Edge => "ms:edgeOptions",
        }
    }

    /// Driver defaults before environment keys are applied
    fn defaults(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "browserName".to_string(),
            Value::String(self.default_browser_name().to_string()),
        );
        caps.insert(self.vendor_options_key().to_string(), json!({}));
        caps
    }
}

/// Build the `alwaysMatch` capability object for one environment
#[must_use]
pub fn build_capabilities(env: &EnvironmentSpec, provider_options_key: &str) -> Value {
    let kind = BrowserKind::from_name(&env.browser_name);
    let mut caps = kind.defaults();

    caps.insert(
        "browserName".to_string(),
        Value::String(env.browser_name.clone()),
    );
    if let Some(version) = &env.browser_version {
        caps.insert("browserVersion".to_string(), Value::String(version.clone()));
    }
    for (key, value) in &env.extra {
        if key != provider_options_key {
            caps.insert(key.clone(), value.clone());
        }
    }

    let provider_block = serde_json::to_value(&env.provider_options).unwrap_or(Value::Null);
    caps.insert(provider_options_key.to_string(), provider_block);

    Value::Object(caps)
}

/// Wrap capabilities in a W3C new-session request body
#[must_use]
pub fn new_session_body(capabilities: Value) -> Value {
    json!({ "capabilities": { "alwaysMatch": capabilities } })
}
