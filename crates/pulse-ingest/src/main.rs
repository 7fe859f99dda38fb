//! Pulse Ingest - metric ingestion pipeline

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use pulse_common::logging::{init_logging, LogConfig, LogLevel};
use pulse_ingest::fetch::FetcherFactory;
use pulse_ingest::orchestrator::{CommitOrchestrator, FetchOrchestrator};
use pulse_ingest::processor::ProcessorFactory;
use pulse_ingest::provider::ProviderClient;
use pulse_ingest::trigger::commit_trigger;
use pulse_ingest::{IngestConfig, Scheduler, StagingArea};

#[derive(Parser, Debug)]
#[command(name = "pulse-ingest")]
#[command(author, version, about = "Metric ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the scheduled fetch and commit loops until interrupted
    Run,

    /// Run a single fetch pass and exit
    FetchOnce,

    /// Run a single commit pass and exit
    CommitOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("pulse-ingest".to_string())
        .build();
    let log_config = LogConfig::from_env().unwrap_or(log_config);
    init_logging(&log_config)?;

    let config = IngestConfig::load()?;
    info!(database_url = %config.database_url, "starting pulse-ingest");

    let pool = pulse_store::connect(&config.database_url).await?;
    pulse_store::schema::init(&pool).await?;

    let provider = Arc::new(ProviderClient::new(&config.provider)?);
    let staging = Arc::new(StagingArea::new(
        &config.staging_dir,
        &config.completed_dir,
    )?);

    let (trigger, signal) = commit_trigger();
    let fetch = FetchOrchestrator::new(
        provider.clone(),
        FetcherFactory::new(provider)?,
        staging.clone(),
        config.lookback_minutes,
        trigger,
    );
    let commit = CommitOrchestrator::new(
        ProcessorFactory::new(pool, config.store_batch_size)?,
        staging,
    );

    match cli.command {
        Command::Run => {
            let scheduler = Scheduler::new(
                Arc::new(fetch),
                Arc::new(commit),
                config.fetch_interval_secs,
            );
            let (fetch_handle, commit_handle) = scheduler.start(signal);
            tokio::signal::ctrl_c().await?;
            info!("shutdown requested");
            fetch_handle.abort();
            commit_handle.abort();
        },
        Command::FetchOnce => {
            let report = fetch.run().await;
            info!(
                files = report.files_written.len(),
                skipped = report.skipped.len(),
                failures = report.failures.len(),
                "fetch pass complete"
            );
            if !report.is_success() {
                anyhow::bail!("{} metric type(s) failed to fetch", report.failures.len());
            }
        },
        Command::CommitOnce => {
            let report = commit.run().await;
            info!(
                files = report.processed.len(),
                records = report.records_committed(),
                failed = report.failed.len(),
                "commit pass complete"
            );
            if !report.is_success() {
                anyhow::bail!("{} staged file(s) failed to commit", report.failed.len());
            }
        },
    }

    Ok(())
}
