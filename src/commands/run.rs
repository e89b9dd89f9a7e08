use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tribuna::aggregate::Aggregator;
use tribuna::analytics::word_frequency;
use tribuna::config::Config;
use tribuna::models::{EnvironmentSpec, SessionResult};
use tribuna::orchestrator::Orchestrator;
use tribuna::report::{self, RunReport};
use tribuna::session::{RemoteProvider, SessionProvider};
use tribuna::storage::ImageDownloader;
use tribuna::translate::{GoogleTranslator, Translator};
use tribuna::utils::error::AggregateError;

/// Options for the hub-backed run
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub config: Option<PathBuf>,
    pub target_count: Option<usize>,
    pub images_dir: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
    pub labels: Vec<String>,
}

/// Options for a single session against a local driver
#[derive(Debug, Clone)]
pub struct LocalParams {
    pub config: Option<PathBuf>,
    pub endpoint: String,
    pub browser: String,
    pub target_count: Option<usize>,
    pub images_dir: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
}

/// Load the config file if given, otherwise the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn apply_overrides(config: &mut Config, target_count: Option<usize>, images_dir: Option<PathBuf>) {
    if let Some(count) = target_count {
        config.scrape.target_count = count;
    }
    if let Some(dir) = images_dir {
        config.images.dir = dir;
    }
}

/// Environments whose label is in `labels`; all of them when `labels` is empty
pub fn select_environments(envs: &[EnvironmentSpec], labels: &[String]) -> Result<Vec<EnvironmentSpec>> {
    if labels.is_empty() {
        return Ok(envs.to_vec());
    }

    for label in labels {
        if !envs.iter().any(|env| &env.label == label) {
            anyhow::bail!("Unknown environment label: {label}");
        }
    }

    Ok(envs
        .iter()
        .filter(|env| labels.contains(&env.label))
        .cloned()
        .collect())
}

/// Run every configured environment against the remote hub
pub async fn run(params: RunParams) -> Result<ExitCode> {
    let mut config = load_config(params.config.as_deref())?;
    apply_overrides(&mut config, params.target_count, params.images_dir);
    config.validate().context("Invalid configuration")?;

    if !config.has_credentials() {
        anyhow::bail!(
            "Hub credentials missing: set BROWSERSTACK_USERNAME and BROWSERSTACK_ACCESS_KEY \
             or hub.username / hub.access_key in the config file"
        );
    }

    let envs = select_environments(&config.environments, &params.labels)?;
    let provider = RemoteProvider::new(&config.hub).context("Failed to create hub client")?;

    println!("Starting tribuna run");
    println!("====================");
    println!("Hub: {}", provider.endpoint());
    println!("Sessions: {}", envs.len());
    println!("Target items: {}", config.scrape.target_count);

    execute(&config, Arc::new(provider), envs, params.json_out.as_deref()).await
}

/// Run a single session against a local WebDriver endpoint
pub async fn local(params: LocalParams) -> Result<ExitCode> {
    let mut config = load_config(params.config.as_deref())?;
    apply_overrides(&mut config, params.target_count, params.images_dir);
    config.validate().context("Invalid configuration")?;

    let provider = RemoteProvider::local(
        &params.endpoint,
        Duration::from_secs(config.hub.request_timeout_secs),
    )
    .context("Failed to create local driver client")?;

    let label = format!("Local {}", params.browser);
    let env = EnvironmentSpec::desktop(&params.browser, None, std::env::consts::OS, "", &label);

    println!("Starting local tribuna run");
    println!("==========================");
    println!("Endpoint: {}", provider.endpoint());
    println!("Browser: {}", params.browser);

    execute(&config, Arc::new(provider), vec![env], params.json_out.as_deref()).await
}

/// Orchestrate, aggregate, post-process and report
async fn execute(
    config: &Config,
    provider: Arc<dyn SessionProvider>,
    envs: Vec<EnvironmentSpec>,
    json_out: Option<&Path>,
) -> Result<ExitCode> {
    let translator: Option<Arc<dyn Translator>> = if config.translation.enabled {
        let translator = GoogleTranslator::with_config(config.translation.clone())?;
        Some(Arc::new(translator) as Arc<dyn Translator>)
    } else {
        None
    };

    let results = Orchestrator::new(config, provider, translator).run(envs).await;

    match Aggregator::new(config.scrape.target_count).aggregate(&results) {
        Ok(mut aggregate) => {
            let downloader = ImageDownloader::with_config(config.images.clone())?;
            let images = downloader.download_all(&mut aggregate.items).await;

            let word_counts = word_frequency(
                aggregate.items.iter().map(|item| item.translated_title.as_str()),
                config.run.min_word_count,
            );

            let mut out = io::stdout().lock();
            report::render_items(&mut out, &aggregate.items)?;
            report::render_translations(&mut out, &aggregate.items)?;
            report::render_word_counts(&mut out, &word_counts)?;
            report::render_summary(&mut out, &aggregate.sessions)?;

            if let Some(path) = json_out {
                let run_report = RunReport {
                    aggregate,
                    word_counts,
                    images,
                };
                report::write_json(path, &run_report)?;
                tracing::info!(path = %path.display(), "Report written");
            }
        }
        Err(AggregateError::Empty { sessions }) => {
            println!("\nNo articles were extracted from any session.");
            report::render_summary(&mut io::stdout().lock(), &sessions)?;
        }
    }

    Ok(exit_code(config, &results))
}

fn exit_code(config: &Config, results: &[SessionResult]) -> ExitCode {
    let passed = results.iter().filter(|r| r.success).count();
    let failed = results.len() - passed;

    if config.run.exit_policy.is_failure(passed, failed) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print the configured environment matrix
pub fn environments(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("Environment Matrix");
    println!("==================");
    for env in &config.environments {
        let kind = if env.is_mobile() { "device" } else { "desktop" };
        let version = env.browser_version.as_deref().unwrap_or("-");
        println!("{:<28} {:<8} {:<10} {}", env.label, kind, env.browser_name, version);
    }
    println!("\nTotal: {}", config.environments.len());

    Ok(())
}
