//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::OutputFormat;
use crate::models::{Metric, Site};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Solardash - compare solar irradiance across Benin, Sierra Leone and Togo
///
/// Loads the three cleaned site datasets, filters them by site and date,
/// and prints summary statistics, a GHI ranking, a correlation matrix and
/// a one-way ANOVA. The filtered rows can be exported as CSV.
///
/// Examples:
///   solardash --data-dir ./data
///   solardash --sites benin,togo --metric dni --start 2021-09-01 --end 2021-09-30
///   solardash --format json --output dashboard.json --export filtered.csv
///   solardash --interactive
///   solardash --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing the per-site CSV files
    #[arg(long, value_name = "DIR", env = "SOLARDASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Sites to include (comma-separated)
    ///
    /// Values: benin, sierra-leone, togo. Defaults to all three.
    #[arg(short, long, value_name = "SITES", value_delimiter = ',')]
    pub sites: Option<Vec<Site>>,

    /// Metric for the distribution view
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Option<Metric>,

    /// First date to include (YYYY-MM-DD)
    ///
    /// Defaults to the first date in the data.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD), inclusive
    ///
    /// Defaults to the last date in the data.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Export the filtered rows as CSV to this file
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Start an interactive session that re-renders on every change
    #[arg(short, long)]
    pub interactive: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .solardash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .solardash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate data directory if provided
        if let Some(ref dir) = self.data_dir {
            if !dir.exists() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Data path is not a directory: {}", dir.display()));
            }
        }

        if let Some(ref export) = self.export {
            if export.is_dir() {
                return Err(format!("Export path is a directory: {}", export.display()));
            }
        }

        Ok(())
    }
}
