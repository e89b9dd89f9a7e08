//! Unified error handling for the tribuna crate
//!
//! A session ends at the first stage error it cannot degrade. [`Error`]
//! wraps those stage errors from [`crate::utils::error`] so the runner can
//! carry one type through `?` and report it in the session result. Best-effort
//! steps (translation, images) never produce an `Error`; they record a
//! [`crate::models::StepOutcome`] instead.

use thiserror::Error;

// Re-export stage errors for convenience
pub use crate::utils::error::{
    AggregateError, ExtractionError, ImageFetchError, LinkCollectionError, NavigationError,
    ProvisioningError, SessionError, TranslationError,
};

/// Error that ends one session
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Link collection error: {0}")]
    LinkCollection(#[from] LinkCollectionError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Anything else that ended the session, such as a panic
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other(context.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
