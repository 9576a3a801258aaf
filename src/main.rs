//! Mojo-Sweep main entry point
//!
//! This is the command-line interface for the Mojo-Sweep profile sweeper.

use anyhow::Context;
use clap::Parser;
use mojo_sweep::config::{load_config_with_hash, validate, Config};
use mojo_sweep::crawler::run_sweep;
use mojo_sweep::output::{
    export_records, generate_markdown_summary, print_statistics, SweepSummary,
};
use mojo_sweep::storage::{Checkpoint, CheckpointStore, JsonFileStore};
use mojo_sweep::SweepStatus;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Mojo-Sweep: a resumable profile ID sweeper
///
/// Mojo-Sweep walks a range of numeric profile IDs, extracts the name and
/// phone number of every profile, validates the number and checkpoints
/// progress so an interrupted sweep picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "mojo-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A resumable profile ID sweeper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First profile ID to sweep
    #[arg(long)]
    start_id: Option<u64>,

    /// Last profile ID to sweep (inclusive)
    #[arg(long)]
    end_id: Option<u64>,

    /// Maximum number of requests in flight
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// IDs per batch
    #[arg(long)]
    batch_size: Option<u64>,

    /// Save a checkpoint after this many processed IDs
    #[arg(long)]
    save_every: Option<u64>,

    /// Checkpoint file path
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also append log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Start a fresh sweep, ignoring an existing checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be swept without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_only"])]
    dry_run: bool,

    /// Show statistics from the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_only"])]
    stats: bool,

    /// Export records and summary from the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "no_export"])]
    export_only: bool,

    /// Do not export records or write the summary after the sweep
    #[arg(long)]
    no_export: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(start_id) = self.start_id {
            config.crawler.start_id = start_id;
        }
        if let Some(end_id) = self.end_id {
            config.crawler.end_id = end_id;
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.crawler.max_concurrent = max_concurrent;
        }
        if let Some(batch_size) = self.batch_size {
            config.crawler.batch_size = batch_size;
        }
        if let Some(save_every) = self.save_every {
            config.crawler.save_every = save_every;
        }
        if let Some(checkpoint) = &self.checkpoint {
            config.output.checkpoint_path = checkpoint.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    // Load and validate configuration
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_only {
        handle_export_only(&config, config_hash)?;
    } else {
        handle_sweep(&config, config_hash, cli.fresh, cli.no_export).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Log lines go to stdout and, when `log_file` is given, are appended to
/// that file without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mojo_sweep=info,warn"),
            1 => EnvFilter::new("mojo_sweep=debug,info"),
            2 => EnvFilter::new("mojo_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_file_layer = match log_file {
        Some(path) => Some(
            file_layer(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?,
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(log_file_layer)
        .init();

    Ok(())
}

/// Formatting layer that appends plain log lines to `path`
fn file_layer<S>(path: &Path) -> std::io::Result<fmt::Layer<S, DefaultFields, Format, Mutex<File>>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false))
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Mojo-Sweep Dry Run ===\n");

    println!("Sweep:");
    println!(
        "  ID range: {} - {} ({} IDs)",
        config.crawler.start_id,
        config.crawler.end_id,
        (config.crawler.end_id - config.crawler.start_id).saturating_add(1)
    );
    println!("  Max concurrent requests: {}", config.crawler.max_concurrent);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Checkpoint every: {} IDs", config.crawler.save_every);

    println!("\nHTTP:");
    println!("  URL template: {}", config.http.url_template);
    println!("  User agent: {}", config.http.user_agent);
    println!(
        "  Timeouts: connect {}s, total {}s",
        config.http.connect_timeout_secs, config.http.timeout_secs
    );
    println!(
        "  Connections: {} total, {} per host",
        config.http.max_connections, config.http.max_connections_per_host
    );
    println!("  Max retries: {}", config.http.max_retries);

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    for format in &config.output.formats {
        println!("  Export: {}.{}", config.output.export_base, format.extension());
    }
    if !config.output.summary_path.is_empty() {
        println!("  Summary: {}", config.output.summary_path);
    }

    println!("\n✓ Configuration is valid");
}

/// Loads the configured checkpoint, failing if there is none
fn load_checkpoint(config: &Config) -> anyhow::Result<Checkpoint> {
    let store = JsonFileStore::new(&config.output.checkpoint_path);
    store
        .load()
        .with_context(|| format!("Failed to read checkpoint {}", config.output.checkpoint_path))?
        .with_context(|| format!("No checkpoint found at {}", config.output.checkpoint_path))
}

/// Handles the --stats mode: shows statistics from the checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Checkpoint: {}\n", config.output.checkpoint_path);

    let checkpoint = load_checkpoint(config)?;
    println!(
        "Saved at: {} ({} records)\n",
        checkpoint.saved_at,
        checkpoint.records.len()
    );
    print_statistics(
        &checkpoint.stats,
        (config.crawler.end_id - config.crawler.start_id).saturating_add(1),
    );

    Ok(())
}

/// Handles the --export-only mode: re-exports records from the checkpoint
fn handle_export_only(config: &Config, config_hash: Option<String>) -> anyhow::Result<()> {
    println!("=== Exporting Sweep Results ===\n");
    println!("Checkpoint: {}", config.output.checkpoint_path);

    let checkpoint = load_checkpoint(config)?;
    let summary = SweepSummary::new(
        config.crawler.start_id,
        config.crawler.end_id,
        &checkpoint.stats,
        &checkpoint.records,
    );
    write_outputs(config, &checkpoint.records, attach_hash(summary, config_hash))
}

/// Handles the main sweep operation
async fn handle_sweep(
    config: &Config,
    config_hash: Option<String>,
    fresh: bool,
    no_export: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // First Ctrl-C stops the sweep gracefully; the coordinator saves on the way out
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing up and saving checkpoint...");
            signal_token.cancel();
        }
    });

    let report = match run_sweep(config, fresh, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            return Err(e.into());
        }
    };

    match report.status {
        SweepStatus::Completed => tracing::info!("Sweep completed successfully"),
        SweepStatus::Interrupted => {
            tracing::info!("Sweep interrupted; run again to resume from the checkpoint")
        }
    }

    if no_export {
        return Ok(());
    }

    let summary = SweepSummary::new(
        config.crawler.start_id,
        config.crawler.end_id,
        &report.stats,
        &report.records,
    )
    .with_status(report.status)
    .with_resumed_from(report.resumed_from);

    write_outputs(config, &report.records, attach_hash(summary, config_hash))
}

fn attach_hash(summary: SweepSummary, config_hash: Option<String>) -> SweepSummary {
    match config_hash {
        Some(hash) => summary.with_config_hash(hash),
        None => summary,
    }
}

/// Exports records and writes the markdown summary
fn write_outputs(
    config: &Config,
    records: &[mojo_sweep::Record],
    summary: SweepSummary,
) -> anyhow::Result<()> {
    for path in export_records(records, &config.output)? {
        println!("✓ Records exported to: {}", path.display());
    }

    if !config.output.summary_path.is_empty() {
        let path = Path::new(&config.output.summary_path);
        generate_markdown_summary(&summary, path)?;
        println!("✓ Summary exported to: {}", path.display());
    }

    Ok(())
}
