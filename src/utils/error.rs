//! Error types for the tribuna scraper
//!
//! This module defines the per-stage error taxonomy used throughout the
//! application. Which stage an error belongs to decides how far it
//! propagates: item-level errors degrade a record, session-level errors end
//! one session, and only an empty aggregate ends the pipeline.

use thiserror::Error;

use crate::models::SessionSummary;

/// Errors raised by a live browser session (WebDriver transport or protocol)
#[derive(Error, Debug)]
pub enum SessionError {
    /// HTTP transport failure talking to the WebDriver endpoint
    #[error("WebDriver transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a W3C error object
    #[error("WebDriver error {error}: {message}")]
    WebDriver { error: String, message: String },

    /// The endpoint answered with something that is not a W3C response
    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),

    /// The session does not support this location strategy
    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),

    /// The element handle no longer refers to an element
    #[error("Stale element: {0}")]
    StaleElement(String),
}

impl SessionError {
    /// Whether repeating the same command may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Protocol(_) => true,
            Self::WebDriver { error, .. } => {
                matches!(error.as_str(), "timeout" | "unknown error" | "script timeout")
            }
            Self::UnsupportedLocator(_) | Self::StaleElement(_) => false,
        }
    }
}

/// Errors that prevent a session from being created
#[derive(Error, Debug)]
pub enum ProvisioningError {
    /// The hub rejected the credentials
    #[error("Authentication rejected by hub (HTTP {0})")]
    Auth(u16),

    /// The hub could not be reached
    #[error("Hub unreachable: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// The hub refused the requested capabilities
    #[error("Invalid capabilities: {0}")]
    InvalidCapability(String),

    /// The hub answered but no session id could be read
    #[error("Session creation protocol error: {0}")]
    Protocol(String),
}

/// Errors that prevent a session from reaching the target section
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The landing page could not be loaded, even after retries
    #[error("Landing page unreachable: {url}: {reason}")]
    LandingUnreachable { url: String, reason: String },

    /// Every locate strategy was exhausted without a match
    #[error("Could not locate the section link (tried: {})", attempted.join(", "))]
    SectionNotFound { attempted: Vec<String> },
}

/// Errors raised while harvesting item links from the section page
#[derive(Error, Debug)]
pub enum LinkCollectionError {
    /// Neither the structured locator nor the anchor scan produced a link
    #[error("No item links found on section page {0}")]
    NoLinks(String),
}

/// Errors raised while extracting a single item page
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The item page could not be loaded or snapshotted
    #[error("Item page unreachable: {url}: {source}")]
    Load {
        url: String,
        #[source]
        source: SessionError,
    },
}

/// Errors raised by the translation service (always non-fatal)
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP request to the translation endpoint failed
    #[error("Translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Translation endpoint returned HTTP {0}")]
    Status(u16),

    /// Response body did not have the expected shape
    #[error("Malformed translation response: {0}")]
    Malformed(String),
}

/// Errors raised while downloading an item image (always non-fatal)
#[derive(Error, Debug)]
pub enum ImageFetchError {
    /// HTTP request failed or timed out
    #[error("Image request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Image server returned HTTP {0}")]
    Status(u16),

    /// The image could not be written to disk
    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when merging session results
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Every session came back empty while items were expected
    #[error("No items extracted from any of {} session(s)", sessions.len())]
    Empty { sessions: Vec<SessionSummary> },
}
