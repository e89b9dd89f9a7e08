//! Parallel session orchestration
//!
//! One tokio task per environment, all spawned at once on a [`JoinSet`].
//! Each task is isolated with `catch_unwind`, so a panicking or failing
//! session becomes a failed [`SessionResult`] without touching its siblings.
//! Results come back in completion order.

pub mod runner;

pub use runner::SessionRunner;

use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::models::{EnvironmentSpec, SessionResult};
use crate::session::SessionProvider;
use crate::translate::Translator;

/// Fans environments out to concurrent sessions and joins their results
pub struct Orchestrator {
    runner: Arc<SessionRunner>,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        provider: Arc<dyn SessionProvider>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Self {
        Self {
            runner: Arc::new(SessionRunner::new(config, provider, translator)),
        }
    }

    /// Run one session per environment; one result per environment, in completion order
    pub async fn run(&self, envs: Vec<EnvironmentSpec>) -> Vec<SessionResult> {
        tracing::info!(sessions = envs.len(), "Starting parallel sessions");

        let labels: Vec<String> = envs.iter().map(|env| env.label.clone()).collect();
        let mut set = JoinSet::new();

        for env in envs {
            let runner = Arc::clone(&self.runner);
            set.spawn(async move {
                match AssertUnwindSafe(runner.run(&env)).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = runner::panic_message(panic.as_ref());
                        tracing::error!(label = %env.label, error = %message, "Session task panicked");
                        SessionResult::failed(&env.label, Vec::new(), message)
                    }
                }
            });
        }

        let mut results = Vec::with_capacity(labels.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => tracing::error!(error = %err, "Session task failed to join"),
            }
        }

        // A task lost to the runtime still owes its environment a result
        let reported: HashSet<String> = results.iter().map(|r| r.label.clone()).collect();
        for label in labels {
            if !reported.contains(&label) {
                results.push(SessionResult::failed(&label, Vec::new(), "session task was lost"));
            }
        }

        tracing::info!(
            passed = results.iter().filter(|r| r.success).count(),
            failed = results.iter().filter(|r| !r.success).count(),
            "All sessions finished"
        );
        results
    }
}
