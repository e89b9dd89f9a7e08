//! Cross-session merge
//!
//! Items are concatenated in result order (each session keeps its own
//! order), deduplicated by URL with the first occurrence winning, and capped
//! at the target count.

use std::collections::HashSet;

use crate::models::{AggregateReport, SessionResult, SessionSummary};
use crate::utils::error::AggregateError;

/// Deduplicates and caps items from many sessions
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    target_count: usize,
}

impl Aggregator {
    pub fn new(target_count: usize) -> Self {
        Self { target_count }
    }

    /// Merge results into one report
    ///
    /// # Errors
    /// Returns `AggregateError::Empty` when nothing survived the merge while
    /// items were expected. The error keeps every session summary.
    pub fn aggregate(&self, results: &[SessionResult]) -> Result<AggregateReport, AggregateError> {
        let sessions: Vec<SessionSummary> = results.iter().map(SessionResult::summary).collect();

        let mut seen = HashSet::new();
        let items: Vec<_> = results
            .iter()
            .flat_map(|result| result.items.iter())
            .filter(|item| seen.insert(item.url().to_string()))
            .take(self.target_count)
            .cloned()
            .collect();

        if items.is_empty() && self.target_count > 0 {
            tracing::error!(sessions = sessions.len(), "No items extracted from any session");
            return Err(AggregateError::Empty { sessions });
        }

        tracing::info!(
            items = items.len(),
            target = self.target_count,
            sessions = sessions.len(),
            "Aggregated session results"
        );

        Ok(AggregateReport {
            run_id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now(),
            items,
            sessions,
        })
    }
}
