//! End-to-end orchestration tests with fake sessions

mod common;

use common::*;
use std::collections::HashSet;
use std::sync::Arc;

use tribuna::aggregate::Aggregator;
use tribuna::config::ExtractionPolicy;
use tribuna::models::{NavigationPath, SessionResult, StepOutcome};
use tribuna::orchestrator::{Orchestrator, SessionRunner};
use tribuna::session::SessionStatus;
use tribuna::translate::Translator;

fn result_for<'a>(results: &'a [SessionResult], label: &str) -> &'a SessionResult {
    results
        .iter()
        .find(|r| r.label == label)
        .unwrap_or_else(|| panic!("no result for {label}"))
}

#[tokio::test]
async fn test_parallel_sessions_merge_into_distinct_items() {
    let provider = Arc::new(
        FakeProvider::new()
            .site("Chrome Test", desktop_site(&["a1", "a2", "a3", "a4", "a5"]))
            .site("Firefox Test", desktop_site(&["a1", "a2", "b3", "b4", "b5"]))
            .site("Edge Test", desktop_site(&["c1", "c2", "c3", "c4", "c5"])),
    );
    let translator: Option<Arc<dyn Translator>> = Some(Arc::new(PrefixTranslator));
    let orchestrator = Orchestrator::new(&fast_config(5), provider.clone(), translator);

    let results = orchestrator
        .run(vec![env("Chrome Test"), env("Firefox Test"), env("Edge Test")])
        .await;

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.success, "{} failed: {:?}", result.label, result.error);
        assert_eq!(result.items.len(), 5);
        assert_eq!(result.navigation_path, Some(NavigationPath::Desktop));
        assert_eq!(result.consent, StepOutcome::Succeeded);
    }

    let report = Aggregator::new(5).aggregate(&results).unwrap();
    assert_eq!(report.items.len(), 5);
    let urls: HashSet<&str> = report.items.iter().map(|item| item.url()).collect();
    assert_eq!(urls.len(), 5);
    assert_eq!(report.sessions.len(), 3);
    assert_eq!(report.passed_sessions(), 3);

    let first = &report.items[0];
    assert!(first.title.as_deref().unwrap().starts_with("Tribuna "));
    assert_eq!(
        first.translated_title,
        format!("EN {}", first.title.as_deref().unwrap())
    );
    assert_eq!(first.translation, StepOutcome::Succeeded);
    assert!(first.body.contains("\n\n"));
    assert!(first.image_url.is_some());
}

#[tokio::test]
async fn test_every_session_quits_exactly_once() {
    let provider = Arc::new(
        FakeProvider::new()
            .site("Chrome Test", desktop_site(&["a1", "a2"]))
            .site("Edge Test", Site::new().failing(BASE_URL)),
    );
    let orchestrator = Orchestrator::new(&fast_config(5), provider.clone(), None);

    let results = orchestrator
        .run(vec![env("Chrome Test"), env("Edge Test")])
        .await;

    assert!(result_for(&results, "Chrome Test").success);
    assert!(!result_for(&results, "Edge Test").success);

    for label in ["Chrome Test", "Edge Test"] {
        let log = provider.log(label).unwrap();
        assert_eq!(log.quit_count, 1, "{label} quit count");
        assert_eq!(log.statuses.len(), 1, "{label} status reports");
    }

    let chrome = provider.log("Chrome Test").unwrap();
    assert_eq!(
        chrome.statuses[0],
        (SessionStatus::Passed, "Scraped 2 item(s)".to_string())
    );
    let edge = provider.log("Edge Test").unwrap();
    assert_eq!(edge.statuses[0].0, SessionStatus::Failed);
}

#[tokio::test]
async fn test_failures_do_not_affect_siblings() {
    let crashy = desktop_site(&["x1", "x2"]).panicking(&format!("{SECTION_URL}x1.html"));
    let provider = Arc::new(
        FakeProvider::new()
            .site("Chrome Test", desktop_site(&["a1", "a2", "a3"]))
            .site("Crash Test", crashy)
            .refusing("Refused Test"),
    );
    let orchestrator = Orchestrator::new(&fast_config(5), provider.clone(), None);

    let results = orchestrator
        .run(vec![env("Chrome Test"), env("Crash Test"), env("Refused Test")])
        .await;

    assert_eq!(results.len(), 3);

    let chrome = result_for(&results, "Chrome Test");
    assert!(chrome.success);
    assert_eq!(chrome.items.len(), 3);

    let crashed = result_for(&results, "Crash Test");
    assert!(!crashed.success);
    assert!(crashed.error.as_deref().unwrap().contains("panicked"));
    assert_eq!(provider.log("Crash Test").unwrap().quit_count, 1);

    let refused = result_for(&results, "Refused Test");
    assert!(!refused.success);
    assert!(refused.items.is_empty());
    assert!(provider.log("Refused Test").is_none());
    assert_eq!(provider.provisioned(), 2);
}

#[tokio::test]
async fn test_extraction_failure_aborts_session_by_default() {
    let site = desktop_site(&["a1", "a2", "a3"]).failing(&format!("{SECTION_URL}a2.html"));
    let provider = Arc::new(FakeProvider::new().site("Chrome Test", site));
    let runner = SessionRunner::new(&fast_config(5), provider.clone(), None);

    let result = runner.run(&env("Chrome Test")).await;

    assert!(!result.success);
    assert_eq!(result.items.len(), 1);
    assert!(result.error.as_deref().unwrap().contains("a2.html"));
    assert_eq!(provider.log("Chrome Test").unwrap().quit_count, 1);
}

#[tokio::test]
async fn test_skip_item_policy_keeps_going() {
    let mut config = fast_config(5);
    config.scrape.extraction_policy = ExtractionPolicy::SkipItem;
    let site = desktop_site(&["a1", "a2", "a3"]).failing(&format!("{SECTION_URL}a2.html"));
    let provider = Arc::new(FakeProvider::new().site("Chrome Test", site));
    let runner = SessionRunner::new(&config, provider, None);

    let result = runner.run(&env("Chrome Test")).await;

    assert!(result.success);
    let urls: Vec<&str> = result.items.iter().map(|item| item.url()).collect();
    assert_eq!(
        urls,
        vec![
            "https://elpais.com/opinion/a1.html",
            "https://elpais.com/opinion/a3.html"
        ]
    );
}

#[tokio::test]
async fn test_translation_failure_is_not_fatal() {
    let provider = Arc::new(FakeProvider::new().site("Chrome Test", desktop_site(&["a1", "a2"])));
    let translator: Option<Arc<dyn Translator>> = Some(Arc::new(DownTranslator));
    let runner = SessionRunner::new(&fast_config(5), provider, translator);

    let result = runner.run(&env("Chrome Test")).await;

    assert!(result.success);
    assert_eq!(result.items.len(), 2);
    for item in &result.items {
        assert!(item.translated_title.is_empty());
        assert!(matches!(item.translation, StepOutcome::FailedNonFatal(_)));
        assert!(item.title.is_some());
    }
}

#[tokio::test]
async fn test_no_translator_leaves_titles_untranslated() {
    let provider = Arc::new(FakeProvider::new().site("Chrome Test", desktop_site(&["a1"])));
    let runner = SessionRunner::new(&fast_config(5), provider, None);

    let result = runner.run(&env("Chrome Test")).await;

    assert_eq!(result.items[0].translation, StepOutcome::NotAttempted);
}

#[tokio::test]
async fn test_all_sessions_empty_aggregates_to_error() {
    let provider = Arc::new(
        FakeProvider::new()
            .refusing("Chrome Test")
            .refusing("Edge Test"),
    );
    let orchestrator = Orchestrator::new(&fast_config(5), provider, None);

    let results = orchestrator
        .run(vec![env("Chrome Test"), env("Edge Test")])
        .await;

    assert!(results.iter().all(|r| !r.success));
    assert!(Aggregator::new(5).aggregate(&results).is_err());
}

#[tokio::test]
async fn test_zero_target_passes_with_no_items() {
    let provider = Arc::new(FakeProvider::new().site("Chrome Test", desktop_site(&["a1", "a2"])));
    let runner = SessionRunner::new(&fast_config(0), provider.clone(), None);

    let result = runner.run(&env("Chrome Test")).await;

    assert!(result.success, "{:?}", result.error);
    assert!(result.items.is_empty());
    assert_eq!(result.navigation_path, Some(NavigationPath::Desktop));
    let log = provider.log("Chrome Test").unwrap();
    assert_eq!(
        log.statuses[0],
        (SessionStatus::Passed, "Scraped 0 item(s)".to_string())
    );
}
