//! Image acquisition for aggregated items
//!
//! Bytes are written as served; the extension comes from the response
//! `content-type`. Each download is independent: one failure leaves that
//! item's `image_path` empty and the batch moves on.

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ImageConfig;
use crate::models::{Item, StepOutcome};
use crate::utils::error::ImageFetchError;

/// File extension for a served content type (`png`, `webp`, else `jpg`)
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    if content_type.contains("png") {
        "png"
    } else if content_type.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// Downloads item images into a local directory
pub struct ImageDownloader {
    client: Client,
    config: ImageConfig,
}

impl ImageDownloader {
    pub fn with_config(config: ImageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Output directory
    pub fn dir(&self) -> &std::path::Path {
        &self.config.dir
    }

    /// Download every item's image; one outcome per item, in order
    ///
    /// Items are numbered from 1 in the order given, whether or not they
    /// carry an image URL.
    pub async fn download_all(&self, items: &mut [Item]) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());

        for (idx, item) in items.iter_mut().enumerate() {
            let Some(url) = item.image_url.clone() else {
                outcomes.push(StepOutcome::NotAttempted);
                continue;
            };

            match self.download(&url, idx + 1).await {
                Ok(path) => {
                    tracing::info!(url = %url, path = %path.display(), "Saved image");
                    item.image_path = Some(path);
                    outcomes.push(StepOutcome::Succeeded);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Image download failed");
                    item.image_path = None;
                    outcomes.push(StepOutcome::failed(e));
                }
            }
        }

        outcomes
    }

    /// Fetch one image and write it as `{prefix}_{index}.{ext}`
    pub async fn download(&self, url: &str, index: usize) -> Result<PathBuf, ImageFetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status(status.as_u16()));
        }

        let ext = extension_for(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        let bytes: Bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.config.dir).await?;
        let path = self
            .config
            .dir
            .join(format!("{}_{}.{}", self.config.prefix, index, ext));
        tokio::fs::write(&path, &bytes).await?;

        Ok(path)
    }
}
