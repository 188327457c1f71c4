//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use crate::analysis::SampleStrategy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// VulnSample - sampled fleet vulnerability statistics
///
/// Draws a random sample of systems from a local profile database and
/// reports total and per-system average CVE and package counts.
///
/// Examples:
///   vulnsample profiles.db 1000
///   vulnsample profiles.db 500 --seed 7 --describe
///   vulnsample profiles.db 50 --per-system --format markdown -o sample.md
///   vulnsample profiles.db --import profiles.jsonl
///   vulnsample --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the SQLite profile database
    #[arg(value_name = "DATABASE", required_unless_present = "init_config")]
    pub database: Option<PathBuf>,

    /// Number of systems to sample
    ///
    /// Capped at the number of evaluated systems in the database.
    #[arg(
        value_name = "SAMPLE_SIZE",
        required_unless_present_any = ["init_config", "import"]
    )]
    pub sample_size: Option<u64>,

    /// Import profiles from a JSON-lines file into DATABASE and exit
    ///
    /// Each line is {"inventory_id": "...", "profile": {...}}. Existing
    /// systems are left untouched.
    #[arg(long, value_name = "FILE", conflicts_with = "sample_size")]
    pub import: Option<PathBuf>,

    /// Sampling strategy
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<SampleStrategy>,

    /// Seed for reproducible sampling (implies --strategy reservoir)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include one line per sampled system
    #[arg(long)]
    pub per_system: bool,

    /// Include count/mean/std/quartiles for each metric
    #[arg(long)]
    pub describe: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vulnsample.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .vulnsample.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text summary lines (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// The sample size itself is checked by the sampler.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref import) = self.import {
            if !import.is_file() {
                return Err(format!("Import file does not exist: {}", import.display()));
            }
            return Ok(());
        }

        if let Some(ref database) = self.database {
            if !database.is_file() {
                return Err(format!(
                    "Profile database does not exist: {}",
                    database.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(database: PathBuf) -> Args {
        Args {
            database: Some(database),
            sample_size: Some(10),
            import: None,
            strategy: None,
            seed: None,
            format: None,
            output: None,
            per_system: false,
            describe: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_positional() {
        let args = Args::try_parse_from(["vulnsample", "profiles.db", "250", "--seed", "9"]).unwrap();
        assert_eq!(args.database, Some(PathBuf::from("profiles.db")));
        assert_eq!(args.sample_size, Some(250));
        assert_eq!(args.seed, Some(9));
        assert!(args.format.is_none());
    }

    #[test]
    fn test_sample_size_required() {
        assert!(Args::try_parse_from(["vulnsample", "profiles.db"]).is_err());
        assert!(Args::try_parse_from(["vulnsample", "profiles.db", "--import", "p.jsonl"]).is_ok());
        assert!(Args::try_parse_from(["vulnsample", "--init-config"]).is_ok());
    }

    #[test]
    fn test_negative_sample_size_rejected_by_parser() {
        assert!(Args::try_parse_from(["vulnsample", "profiles.db", "-1"]).is_err());
    }

    #[test]
    fn test_non_numeric_sample_size_rejected_by_parser() {
        assert!(Args::try_parse_from(["vulnsample", "profiles.db", "abc"]).is_err());
    }

    #[test]
    fn test_parse_enums() {
        let args = Args::try_parse_from([
            "vulnsample",
            "profiles.db",
            "5",
            "--strategy",
            "reservoir",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.strategy, Some(SampleStrategy::Reservoir));
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_validation_missing_database() {
        let args = make_args(PathBuf::from("/nonexistent/profiles.db"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("profiles.db"));
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
