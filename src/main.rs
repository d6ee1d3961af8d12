//! feed-digest main entry point
//!
//! This is the command-line interface for the feed digest pipeline.

use anyhow::Context;
use clap::Parser;
use feed_digest::config::{load_config_with_hash, Config};
use feed_digest::pipeline::Orchestrator;
use feed_digest::sources::{ConfigRegistry, SourceRegistry};
use feed_digest::storage::load_archive;
use feed_digest::ConfigError;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Longest accepted `--every` period: one week
const MAX_SCHEDULE_MINUTES: u64 = 7 * 24 * 60;

/// feed-digest: a daily digest of RSS/Atom feeds
///
/// Fetches every configured feed, merges duplicate entries, summarizes them
/// through an LLM provider and emails the result.
#[derive(Parser, Debug)]
#[command(name = "feed-digest")]
#[command(version)]
#[command(about = "Summarized email digests of RSS/Atom feeds", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Recipient address(es), overriding the config and EMAIL_TO
    #[arg(long, value_delimiter = ',')]
    to: Vec<String>,

    /// Print the digest instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Run repeatedly, every MINUTES minutes, until interrupted
    #[arg(
        long,
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u64).range(1..=MAX_SCHEDULE_MINUTES)
    )]
    every: Option<u64>,

    /// List the enabled sources and exit
    #[arg(long, conflicts_with_all = ["history", "every", "dry_run"])]
    list_sources: bool,

    /// Show the last N archived runs and exit
    #[arg(long, value_name = "N", conflicts_with_all = ["list_sources", "every", "dry_run"])]
    history: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run_cli(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if !cli.to.is_empty() {
        config.delivery.to = cli.to.clone();
    }

    if cli.list_sources {
        handle_list_sources(&config)?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(count) = cli.history {
        handle_history(&config, count).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let orchestrator = Orchestrator::from_config(&config, Some(config_hash), cli.dry_run)
        .context("failed to set up the pipeline")?;

    match cli.every {
        Some(minutes) => {
            handle_schedule(&orchestrator, schedule_period(minutes)?).await;
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(handle_run(&orchestrator).await),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_digest=info,warn"),
            1 => EnvFilter::new("feed_digest=debug,info"),
            2 => EnvFilter::new("feed_digest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --list-sources: prints the sources a run would fetch
fn handle_list_sources(config: &Config) -> feed_digest::Result<()> {
    let sources = ConfigRegistry::from_config(config).list_enabled_sources()?;

    println!("Enabled sources ({}):", sources.len());
    for source in &sources {
        println!("  - {} [{}]", source.display_name, source.category);
        println!("    {}", source.url);
        if !source.keywords.is_empty() {
            println!("    keywords: {}", source.keywords.join(", "));
        }
    }
    Ok(())
}

/// Handles --history: prints the most recent archived runs
async fn handle_history(config: &Config, count: usize) -> feed_digest::Result<()> {
    let path = config.archive.path.as_ref().ok_or_else(|| {
        ConfigError::Validation("--history needs an [archive] path".to_string())
    })?;
    let records = load_archive(path).await?;

    println!("Archive: {} ({} runs)\n", path.display(), records.len());
    let skip = records.len().saturating_sub(count);
    for record in &records[skip..] {
        println!("{}", record.result.headline());
    }
    Ok(())
}

/// Runs the pipeline once; the exit code reflects the outcome
async fn handle_run(orchestrator: &Orchestrator) -> ExitCode {
    let result = orchestrator.run().await;
    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Converts `--every` minutes into a schedule period
fn schedule_period(minutes: u64) -> anyhow::Result<Duration> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .with_context(|| format!("--every {} minutes is out of range", minutes))
}

/// Runs the pipeline on a fixed interval until Ctrl-C
///
/// A failed run is logged and the schedule continues.
async fn handle_schedule(orchestrator: &Orchestrator, period: Duration) {
    tracing::info!("Running every {} minute(s); press Ctrl-C to stop", period.as_secs() / 60);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let runs = run_every(period, shutdown, move || async move {
        let result = orchestrator.run().await;
        if !result.is_success() {
            tracing::warn!("Scheduled run failed; waiting for the next one");
        }
    })
    .await;
    tracing::info!("Schedule stopped after {} run(s)", runs);
}

/// Calls `run_once` every `period` until `shutdown` resolves
///
/// `shutdown` is watched while waiting and while a run is in flight; an
/// interrupted run is dropped. Returns the number of runs that completed.
async fn run_every<S, F, Fut>(period: Duration, shutdown: S, mut run_once: F) -> usize
where
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut completed = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping schedule");
                break;
            }
        }
        tokio::select! {
            _ = run_once() => completed += 1,
            _ = &mut shutdown => {
                tracing::info!("Interrupted during a run, stopping schedule");
                break;
            }
        }
    }

    completed
}
