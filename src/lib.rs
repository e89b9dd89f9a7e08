//! tribuna - Parallel multi-browser opinion-section scraper
//!
//! Runs one remote browser session per environment (desktop browsers and
//! real mobile devices), navigates each to the opinion section of a news
//! site, extracts the latest articles, translates their titles, and merges
//! everything into one deduplicated report with images and word statistics.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`session`] - Browser session contracts and the WebDriver client
//! - [`navigator`] - Landing page → consent → section navigation
//! - [`collector`] - Item link collection on the section page
//! - [`parser`] - Article field extraction
//! - [`translate`] - Title translation
//! - [`orchestrator`] - Parallel sessions with failure isolation
//! - [`aggregate`] - Cross-session dedup and cap
//! - [`storage`] - Image downloads
//! - [`analytics`] - Word frequency over translated titles
//! - [`report`] - Console and JSON output
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tribuna::config::Config;
//! use tribuna::orchestrator::Orchestrator;
//! use tribuna::session::RemoteProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let provider = Arc::new(RemoteProvider::new(&config.hub)?);
//!     let orchestrator = Orchestrator::new(&config, provider, None);
//!     let results = orchestrator.run(config.environments.clone()).await;
//!     println!("{} sessions finished", results.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod analytics;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod navigator;
pub mod orchestrator;
pub mod parser;
pub mod report;
pub mod session;
pub mod storage;
pub mod translate;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aggregate::Aggregator;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        AggregateReport, EnvironmentSpec, Item, SessionResult, StepOutcome, WordCount,
    };
    pub use crate::orchestrator::Orchestrator;
    pub use crate::session::{BrowserSession, SessionProvider};
    pub use crate::translate::Translator;
}

// Direct re-exports for convenience
pub use models::{AggregateReport, EnvironmentSpec, Item, SessionResult, StepOutcome};
