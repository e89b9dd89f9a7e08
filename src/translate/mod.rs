//! Title translation
//!
//! Translation is an enrichment step: every failure degrades to an empty
//! translated title plus a [`StepOutcome::FailedNonFatal`] and never fails the
//! session. The entry point builds one translator and hands an
//! `Arc<dyn Translator>` to every session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::TranslationConfig;
use crate::models::StepOutcome;
use crate::utils::error::TranslationError;

/// Translates short texts between two fixed languages
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

/// Client for the public `translate_a/single` endpoint
pub struct GoogleTranslator {
    client: Client,
    config: TranslationConfig,
}

impl GoogleTranslator {
    /// Create a translator with default config (Spanish to English)
    pub fn new() -> Result<Self> {
        Self::with_config(TranslationConfig::default())
    }

    pub fn with_config(config: TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Concatenate the translated segments of a `[[["seg", "src", ...], ...], ...]` body
    fn parse_segments(body: &Value) -> Result<String, TranslationError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| TranslationError::Malformed("missing segment list".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        if translated.is_empty() && !segments.is_empty() {
            return Err(TranslationError::Malformed(
                "segments carry no translated text".to_string(),
            ));
        }

        Ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.config.source.as_str()),
                ("tl", self.config.target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslationError::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Malformed(e.to_string()))?;

        Self::parse_segments(&body)
    }
}

/// Translate an optional title, degrading every failure to an empty string
pub async fn translate_title(
    translator: Option<&dyn Translator>,
    title: Option<&str>,
) -> (String, StepOutcome) {
    let (Some(translator), Some(title)) = (translator, title) else {
        return (String::new(), StepOutcome::NotAttempted);
    };

    match translator.translate(title).await {
        Ok(translated) => (translated, StepOutcome::Succeeded),
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Title translation failed");
            (String::new(), StepOutcome::failed(e))
        }
    }
}
