//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product catalog harvester.

use anyhow::Context;
use catalog_harvest::config::{read_config_with_hash, validate, Config};
use catalog_harvest::output::{print_statistics, write_run, DatasetWriter};
use catalog_harvest::{HarvestError, MergePipeline};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code used when the run is interrupted with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Catalog-Harvest: a listing + detail product catalog harvester
///
/// Catalog-Harvest walks paginated or infinite-scroll product listings,
/// fetches each product's detail page, and writes the merged dataset
/// as JSON and CSV.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A listing + detail product catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to harvest (repeatable; replaces the configured seeds)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum records per seed (overrides input.per-seed-limit)
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Output directory (overrides output.directory)
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without loading any page
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load configuration, apply overrides, then validate the result
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = read_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_harvest(&config, &config_hash).await
}

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.seeds.is_empty() {
        config.input.seeds = cli.seeds.clone();
    }
    if let Some(limit) = cli.limit {
        config.input.per_seed_limit = limit;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let profile = config.site_profile()?;
    let writer = DatasetWriter::from_config(&config.output);

    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Profile: {}", profile.name);
    println!("  Base URL: {}", profile.base_url);
    println!("  Pagination: {:?}", profile.listing.pagination);
    println!("  Listing fields: {}", profile.listing.fields.len());
    println!(
        "  Detail fields: {}",
        profile.detail_field_names().collect::<Vec<_>>().join(", ")
    );

    println!("\nPipeline:");
    println!(
        "  Concurrency: {} listing / {} detail",
        config.pipeline.listing_concurrency, config.pipeline.detail_concurrency
    );
    println!(
        "  Stagnation threshold: {}",
        config.pipeline.stagnation_threshold
    );
    println!(
        "  Max cursor advances: {}",
        config.pipeline.max_cursor_advances
    );
    println!("  Field timeout: {}ms", config.pipeline.field_timeout_ms);
    println!("  Page delay: {}ms", config.pipeline.page_delay_ms);
    println!("  Detail attempts: {}", config.pipeline.detail_attempts);

    println!("\nOutput:");
    println!("  Directory: {}", writer.directory().display());
    println!(
        "  Final CSV: {}",
        writer
            .path_for(catalog_harvest::output::FINAL_CSV_FILE)
            .display()
    );

    println!("\nSeeds ({}):", config.input.seeds.len());
    for seed in &config.input.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} records from each of {} seed URLs",
        config.input.per_seed_limit,
        config.input.seeds.len()
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, config_hash: &str) -> anyhow::Result<ExitCode> {
    let profile = config.site_profile()?;
    let seeds = config.seed_urls()?;
    let pipeline = MergePipeline::new(config)?;

    tracing::info!(
        "Harvesting {} with {} seed URLs (limit {} per seed)",
        profile.name,
        seeds.len(),
        config.input.per_seed_limit
    );

    let outcome = tokio::select! {
        result = pipeline.run(&seeds, config.input.per_seed_limit) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, no output written");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e @ HarvestError::NoSeedLoaded { .. }) => {
            tracing::error!("Harvest failed: {}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    let writer = DatasetWriter::from_config(&config.output);
    write_run(&writer, &outcome, &profile.name, config_hash)
        .context("Failed to write output files")?;

    print_statistics(&outcome.stats);
    Ok(ExitCode::SUCCESS)
}
