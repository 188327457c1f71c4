//! VulnSample - sampled fleet vulnerability statistics
//!
//! A CLI tool that draws a random sample of systems from a local profile
//! database and reports CVE and package totals and per-system averages.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (store failure, empty population, malformed profile, etc.)
//!   2 - Invalid invocation (bad arguments, sample size of zero)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod nevra;
mod report;
mod store;

use analysis::{RunOptions, Sampler};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use error::SampleError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{Report, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use store::SqliteProfileStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("VulnSample v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let outcome = match args.import {
        Some(ref import) => run_import(&args, import),
        None => run_sampling(&args),
    };

    if let Err(e) = outcome {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Exit code for a failed run.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<SampleError>()
        .map(SampleError::exit_code)
        .unwrap_or(1)
}

/// Handle --init-config: generate a default .vulnsample.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Handle --import: load a JSON-lines export into the database.
fn run_import(args: &Args, import: &Path) -> Result<()> {
    let database = args
        .database
        .as_deref()
        .context("No profile database given")?;

    let mut store = SqliteProfileStore::open(database)
        .with_context(|| format!("Failed to open profile database: {}", database.display()))?;

    let stats = ingest::import_profiles(&mut store, import)?;

    println!(
        "✅ Imported {} new profiles ({} read) into {}",
        stats.inserted,
        stats.read,
        database.display()
    );
    Ok(())
}

/// Sample the database and emit the report.
fn run_sampling(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);

    let database = args
        .database
        .as_deref()
        .context("No profile database given")?;
    let requested = args.sample_size.context("No sample size given")?;

    let store = SqliteProfileStore::open_read_only(database)
        .with_context(|| format!("Failed to open profile database: {}", database.display()))?;

    let sampler = Sampler::new(config.sampling.strategy, config.sampling.seed);
    let options = RunOptions {
        per_system: config.report.per_system,
        describe: config.report.describe,
    };
    info!(
        "Sampling {} systems from {} ({} strategy)",
        requested,
        database.display(),
        sampler.strategy()
    );

    let progress = make_progress_bar(args.quiet);
    let run = analysis::run_sample(
        &store,
        &sampler,
        requested,
        options,
        |sampled| progress.set_length(sampled),
        |_| progress.inc(1),
    );
    progress.finish_and_clear();
    let run = run?;

    let duration = start_time.elapsed().as_secs_f64();
    info!(
        "Classified {} of {} systems in {:.1}s",
        run.result.sample_size, run.population, duration
    );

    let report = Report {
        metadata: ReportMetadata {
            database: database.display().to_string(),
            generated_at: Utc::now(),
            population: run.population,
            requested,
            sampled: run.result.sample_size,
            strategy: sampler.strategy().to_string(),
            seed: sampler.seed(),
            duration_seconds: duration,
        },
        result: run.result,
        systems: run.systems,
        distribution: run.distribution,
    };

    let mut output = report::render(&report, config.general.format)?;
    if !output.ends_with('\n') {
        output.push('\n');
    }

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn make_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    match ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} systems ({eta})",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Progress style rejected: {}", e),
    }
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
