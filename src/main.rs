use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "tribuna",
    version,
    about = "Parallel multi-browser scraper for news opinion sections",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured environment on the remote hub
    Run {
        /// Maximum number of articles per session and in the report
        #[arg(short = 'n', long)]
        target_count: Option<usize>,

        /// Directory for downloaded images
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Only run environments with these labels (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },

    /// Run one session against a local WebDriver endpoint
    Local {
        /// WebDriver endpoint URL
        #[arg(long, default_value = "http://localhost:4444")]
        endpoint: String,

        /// Browser name (chrome, firefox, edge)
        #[arg(short, long, default_value = "chrome")]
        browser: String,

        /// Maximum number of articles
        #[arg(short = 'n', long)]
        target_count: Option<usize>,

        /// Directory for downloaded images
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// Print the environment matrix
    Environments,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logging settings come from the config/environment unless the flag overrides them
    let logging = commands::run::load_config(cli.config.as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    let log_format = cli.log_format.as_deref().unwrap_or(&logging.format);
    setup_tracing(log_format, &logging.level, cli.verbose)?;

    tracing::info!("tribuna starting");

    let code = match cli.command {
        Commands::Run {
            target_count,
            images_dir,
            json_out,
            labels,
        } => {
            tracing::info!(
                target_count = ?target_count,
                labels = ?labels,
                "Starting run command"
            );
            commands::run(commands::RunParams {
                config: cli.config,
                target_count,
                images_dir,
                json_out,
                labels,
            })
            .await?
        }

        Commands::Local {
            endpoint,
            browser,
            target_count,
            images_dir,
            json_out,
        } => {
            tracing::info!(endpoint = %endpoint, browser = %browser, "Starting local command");
            commands::local(commands::LocalParams {
                config: cli.config,
                endpoint,
                browser,
                target_count,
                images_dir,
                json_out,
            })
            .await?
        }

        Commands::Environments => {
            commands::environments(cli.config.as_deref())?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("tribuna=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("tribuna={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
