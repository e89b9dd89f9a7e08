//! Browser session contracts and provisioning
//!
//! The automation engine is an external collaborator. Everything above this
//! module talks to it only through [`SessionProvider`] and [`BrowserSession`];
//! [`webdriver`] implements both over the W3C WebDriver protocol.

pub mod capabilities;
pub mod webdriver;

use async_trait::async_trait;
use std::fmt;

use crate::models::EnvironmentSpec;
use crate::utils::error::{ProvisioningError, SessionError};

pub use capabilities::{build_capabilities, BrowserKind};
pub use webdriver::{RemoteProvider, RemoteSession};

/// W3C element location strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    TagName(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    pub fn xpath(expr: &str) -> Self {
        Self::XPath(expr.to_string())
    }

    pub fn tag(name: &str) -> Self {
        Self::TagName(name.to_string())
    }

    /// Strategy name as sent in the `using` field
    pub fn using(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::TagName(_) => "tag name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Css(v) | Self::XPath(v) | Self::TagName(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.using(), self.value())
    }
}

/// Opaque reference to an element inside one session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Out-of-band status reported to the provider at the end of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Passed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// One live, exclusively owned automation session
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Provider-assigned session id
    fn id(&self) -> &str;

    /// Load a URL and wait for the navigation round trip
    async fn goto(&self, url: &str) -> Result<(), SessionError>;

    /// URL of the current document
    async fn current_url(&self) -> Result<String, SessionError>;

    /// All elements matching the locator, in document order
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError>;

    /// Serialized DOM of the current document
    async fn page_source(&self) -> Result<String, SessionError>;

    /// Report pass/fail to the provider; never affects control flow
    async fn set_status(&self, status: SessionStatus, reason: &str) -> Result<(), SessionError>;

    /// Release the session on the provider side
    async fn quit(&self) -> Result<(), SessionError>;
}

/// Creates one configured session per environment
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn create_session(
        &self,
        env: &EnvironmentSpec,
    ) -> Result<Box<dyn BrowserSession>, ProvisioningError>;
}
