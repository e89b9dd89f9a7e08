//! Console and JSON reporting
//!
//! Sections are rendered into any `io::Write` so the binary prints them to
//! stdout and tests render them into a buffer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

use crate::models::{AggregateReport, Item, SessionSummary, StepOutcome, WordCount};
use crate::utils::truncate_text;

/// Maximum characters of body shown per item
pub const BODY_EXCERPT_CHARS: usize = 800;

const RULE: &str = "========================================";

/// Everything a finished run produced, as written by `--json-out`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub aggregate: AggregateReport,
    pub word_counts: Vec<WordCount>,
    pub images: Vec<StepOutcome>,
}

fn heading(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")
}

/// Source titles with a body excerpt
pub fn render_items(out: &mut dyn Write, items: &[Item]) -> io::Result<()> {
    heading(out, "ARTICLES")?;

    for (idx, item) in items.iter().enumerate() {
        writeln!(out, "\n[{}] {}", idx + 1, item.title.as_deref().unwrap_or("(untitled)"))?;
        writeln!(out, "URL: {}", item.url())?;
        if let Some(path) = &item.image_path {
            writeln!(out, "Image: {}", path.display())?;
        }
        if item.body.is_empty() {
            writeln!(out, "(no body text)")?;
        } else {
            writeln!(out, "{}", truncate_text(&item.body, BODY_EXCERPT_CHARS))?;
        }
    }

    Ok(())
}

/// Translated titles, one per item
pub fn render_translations(out: &mut dyn Write, items: &[Item]) -> io::Result<()> {
    heading(out, "TRANSLATED TITLES")?;

    for (idx, item) in items.iter().enumerate() {
        match &item.translation {
            StepOutcome::Succeeded => writeln!(out, "[{}] {}", idx + 1, item.translated_title)?,
            other => writeln!(out, "[{}] (translation {other})", idx + 1)?,
        }
    }

    Ok(())
}

/// Words repeated across translated titles
pub fn render_word_counts(out: &mut dyn Write, counts: &[WordCount]) -> io::Result<()> {
    heading(out, "REPEATED WORDS")?;

    if counts.is_empty() {
        writeln!(out, "No repeated words")?;
    }
    for count in counts {
        writeln!(out, "{}: {}", count.word, count.count)?;
    }

    Ok(())
}

/// Per-session pass/fail block; printed on every run
pub fn render_summary(out: &mut dyn Write, sessions: &[SessionSummary]) -> io::Result<()> {
    heading(out, "SESSION SUMMARY")?;

    for session in sessions {
        let mark = if session.passed { "PASS" } else { "FAIL" };
        write!(out, "[{mark}] {} ({} items)", session.label, session.item_count)?;
        match &session.error {
            Some(error) => writeln!(out, ": {error}")?,
            None => writeln!(out)?,
        }
    }

    let passed = sessions.iter().filter(|s| s.passed).count();
    writeln!(out, "\n{passed}/{} sessions passed", sessions.len())
}

/// Write the run report as pretty JSON
pub fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    Ok(())
}
