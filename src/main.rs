// QuizVault - Main Entry Point
//
// Wires the question source, the durable store, and the harvesting loop,
// then exposes them over the CLI (`collect`) or the HTTP server (`serve`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quizvault::config::Config;
use quizvault::harvest::{HarvestPolicy, Harvester};
use quizvault::server::{self, AppState};
use quizvault::source::HttpQuestionSource;
use quizvault::store::{MemoryQuestionStore, QuestionStore, SqliteQuestionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// QuizVault: unique trivia record collector
#[derive(Parser, Debug)]
#[command(name = "quizvault")]
#[command(author = "QuizVault Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Collect newly-unique trivia records from a remote generator", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a configuration file (default: XDG config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Collect records once and print the last question
    Collect {
        /// Number of newly-unique records to collect
        count: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    init_tracing(&config, args.verbose)?;

    info!("QuizVault v0.1.0 starting...");

    match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.server.port);
            let harvester = build_harvester(&config)?;
            let state = AppState::new(harvester, config.metrics.enabled);
            server::serve(state, port).await?;
        }
        Some(Commands::Collect { count }) => {
            let harvester = build_harvester(&config)?;
            match harvester.collect(count as usize).await? {
                Some(question) => println!("{question}"),
                None => info!("Zero records requested, nothing to collect"),
            }
        }
        None => {
            info!("No command specified. Use \"quizvault --help\" for usage.");
        }
    }

    Ok(())
}

/// Initialize tracing from config, with `--verbose` forcing debug level
fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()?
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        "pretty" => tracing_subscriber::fmt().with_env_filter(filter).pretty().init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).compact().init(),
    }

    Ok(())
}

/// Assemble the harvester from configuration
fn build_harvester(config: &Config) -> Result<Arc<Harvester>> {
    let source = HttpQuestionSource::with_timeout(
        config.source.url.clone(),
        Duration::from_secs(config.source.timeout_secs),
    )
    .context("Failed to build question source")?;

    let store: Arc<dyn QuestionStore> = match config.store.backend.to_lowercase().as_str() {
        "memory" => Arc::new(MemoryQuestionStore::new()),
        _ => Arc::new(
            SqliteQuestionStore::open(&config.store.path)
                .with_context(|| format!("Failed to open store at {}", config.store.path))?,
        ),
    };

    let policy = HarvestPolicy::new()
        .max_attempts(config.harvest.max_attempts)
        .retry_delay(Duration::from_millis(config.harvest.retry_delay_ms));

    Ok(Arc::new(Harvester::with_policy(
        Arc::new(source),
        store,
        policy,
    )))
}
