//! Institution Finder main entry point
//!
//! This is the command-line interface for Institution Finder.

use anyhow::Context;
use clap::Parser;
use institution_finder::config::{load_config_with_hash, Config};
use institution_finder::output::{open_output, spawn_writer, ChannelSink};
use institution_finder::source::{spawn_discovery, InstitutionSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Institution Finder: discovers institutions offering a set of programs
///
/// Institution Finder searches the configured registry region by region, or
/// reads a pre-collected JSON file, and writes one JSON record per institution.
#[derive(Parser, Debug)]
#[command(name = "institution-finder")]
#[command(version)]
#[command(about = "Discovers academic institutions offering a set of programs", long_about = None)]
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

    /// Validate config and show what would be searched without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_run(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout can carry the institution records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("institution_finder=info,warn"),
            1 => EnvFilter::new("institution_finder=debug,info"),
            2 => EnvFilter::new("institution_finder=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Institution Finder Dry Run ===\n");

    println!("Country: {}", config.finder.country);
    if config.finder.uses_registry() {
        println!("Source: registry search");
        println!(
            "  Registry URL: {}",
            config.finder.registry_url.as_deref().unwrap_or_default()
        );
        println!("  Program filter: {}", config.finder.program_filter);
        println!("  Regions ({}): {}", config.finder.regions.len(), config.finder.regions.join(", "));
    } else {
        println!("Source: JSON file");
        println!("  File: {}", config.finder.json_file().display());
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s (connect {}s)", config.http.timeout_secs, config.http.connect_timeout_secs);
    println!("  Retry backoff: {}ms", config.http.retry_backoff_ms);

    println!("\nOutput:");
    match &config.output.path {
        Some(path) => println!("  File: {}", path.display()),
        None => println!("  stdout"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main discovery run
async fn handle_run(config: Config) -> anyhow::Result<()> {
    let source = InstitutionSource::from_config(&config).context("Failed to set up source")?;

    let output = open_output(config.output.path.as_deref())
        .await
        .context("Failed to open output")?;
    let (sink, receiver) = ChannelSink::channel();
    let writer = spawn_writer(receiver, output);

    let run = spawn_discovery(Arc::new(source), Arc::new(sink));
    tracing::info!("Discovery started");

    let summary = run.await.context("Discovery task panicked")??;
    let written = writer.await.context("Output writer panicked")?;

    tracing::info!(
        "Wrote {} of {} institutions",
        written,
        summary.institutions
    );

    Ok(())
}
