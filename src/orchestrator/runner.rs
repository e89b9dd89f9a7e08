//! One session, end to end
//!
//! provision → navigate → collect → extract + translate each item →
//! report status → quit. The handle is released on every path after
//! provisioning, including a panic inside the session steps.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::collector::LinkCollector;
use crate::config::{Config, ExtractionPolicy};
use crate::error::Error;
use crate::models::{EnvironmentSpec, Item, NavigationPath, SessionResult, StepOutcome};
use crate::navigator::{Navigator, NavigatorConfig};
use crate::parser::ArticleExtractor;
use crate::session::{BrowserSession, SessionProvider, SessionStatus};
use crate::translate::{translate_title, Translator};

/// State accumulated while a session runs; survives a mid-session failure
#[derive(Debug, Default)]
struct Progress {
    items: Vec<Item>,
    consent: StepOutcome,
    navigation_path: Option<NavigationPath>,
}

/// Runs the per-session state machine against one environment
pub struct SessionRunner {
    provider: Arc<dyn SessionProvider>,
    translator: Option<Arc<dyn Translator>>,
    navigator: Navigator,
    collector: LinkCollector,
    extractor: ArticleExtractor,
    policy: ExtractionPolicy,
}

impl SessionRunner {
    pub fn new(
        config: &Config,
        provider: Arc<dyn SessionProvider>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Self {
        Self {
            provider,
            translator,
            navigator: Navigator::new(NavigatorConfig::from_config(config)),
            collector: LinkCollector::from_config(config),
            extractor: ArticleExtractor::new(),
            policy: config.scrape.extraction_policy,
        }
    }

    /// Run one session; always produces exactly one result
    pub async fn run(&self, env: &EnvironmentSpec) -> SessionResult {
        let label = env.label.as_str();
        tracing::info!(label = %label, browser = %env.browser_name, "Starting session");

        let session = match self.provider.create_session(env).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(label = %label, error = %e, "Session provisioning failed");
                return SessionResult::failed(label, Vec::new(), Error::from(e));
            }
        };
        tracing::debug!(label = %label, session_id = %session.id(), "Session provisioned");

        let mut progress = Progress::default();
        let outcome = AssertUnwindSafe(self.drive(session.as_ref(), &mut progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::other(panic_message(panic.as_ref()))));

        let (status, reason) = match &outcome {
            Ok(()) => (
                SessionStatus::Passed,
                format!("Scraped {} item(s)", progress.items.len()),
            ),
            Err(e) => (SessionStatus::Failed, e.to_string()),
        };

        if let Err(e) = session.set_status(status, &reason).await {
            tracing::warn!(label = %label, error = %e, "Failed to report session status");
        }
        if let Err(e) = session.quit().await {
            tracing::warn!(label = %label, error = %e, "Failed to quit session");
        }

        let mut result = match outcome {
            Ok(()) => {
                tracing::info!(label = %label, items = progress.items.len(), "Session passed");
                SessionResult::passed(label, progress.items)
            }
            Err(e) => {
                tracing::error!(label = %label, items = progress.items.len(), error = %e, "Session failed");
                SessionResult::failed(label, progress.items, e)
            }
        };
        result.consent = progress.consent;
        result.navigation_path = progress.navigation_path;
        result
    }

    async fn drive(&self, session: &dyn BrowserSession, progress: &mut Progress) -> Result<(), Error> {
        let navigation = self.navigator.run(session).await?;
        progress.consent = navigation.consent;
        progress.navigation_path = Some(navigation.path);

        let links = self.collector.collect(session).await?;
        tracing::info!(
            session_id = %session.id(),
            count = links.urls.len(),
            source = ?links.source,
            "Collected item links"
        );

        for url in &links.urls {
            let mut item = match self.extractor.extract_item(session, url).await {
                Ok(item) => item,
                Err(e) => match self.policy {
                    ExtractionPolicy::AbortSession => return Err(e.into()),
                    ExtractionPolicy::SkipItem => {
                        tracing::warn!(session_id = %session.id(), url = %url, error = %e, "Skipping item");
                        continue;
                    }
                },
            };

            let (translated, outcome) =
                translate_title(self.translator.as_deref(), item.title.as_deref()).await;
            item.translated_title = translated;
            item.translation = outcome;

            progress.items.push(item);
        }

        Ok(())
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic"));
    format!("session panicked: {detail}")
}
