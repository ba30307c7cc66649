//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.solardash.toml` files.

use crate::models::{Metric, Site};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".solardash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Default filter settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output file; stdout when unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the per-site CSV files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing the source files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Benin source file name.
    #[serde(default = "default_benin_file")]
    pub benin: String,

    /// Sierra Leone source file name.
    #[serde(default = "default_sierra_leone_file")]
    pub sierra_leone: String,

    /// Togo source file name.
    #[serde(default = "default_togo_file")]
    pub togo: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            benin: default_benin_file(),
            sierra_leone: default_sierra_leone_file(),
            togo: default_togo_file(),
        }
    }
}

impl DataConfig {
    /// Source file name of a site.
    pub fn file_for(&self, site: Site) -> &str {
        match site {
            Site::Benin => &self.benin,
            Site::SierraLeone => &self.sierra_leone,
            Site::Togo => &self.togo,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_benin_file() -> String {
    "benin_clean.csv".to_string()
}

fn default_sierra_leone_file() -> String {
    "sierraleone_clean.csv".to_string()
}

fn default_togo_file() -> String {
    "togo_clean.csv".to_string()
}

/// Initial dashboard selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sites selected at startup.
    #[serde(default = "default_sites")]
    pub sites: Vec<Site>,

    /// Metric shown in the distribution view.
    #[serde(default)]
    pub metric: Metric,

    /// First date included; the dataset's first date when unset.
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last date included; the dataset's last date when unset.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            metric: Metric::default(),
            start: None,
            end: None,
        }
    }
}

fn default_sites() -> Vec<Site> {
    Site::ALL.to_vec()
}

/// Output format of the dashboard report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Include the correlation matrix.
    #[serde(default = "default_true")]
    pub include_correlation: bool,

    /// Include the per-site distribution table.
    #[serde(default = "default_true")]
    pub include_distribution: bool,

    /// Width in characters of the longest ranking bar.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Significance level used to label the ANOVA result.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_correlation: true,
            include_distribution: true,
            bar_width: default_bar_width(),
            alpha: default_alpha(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bar_width() -> usize {
    40
}

fn default_alpha() -> f64 {
    0.05
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.solardash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.clone();
        }

        if let Some(ref sites) = args.sites {
            self.filter.sites = sites.clone();
        }
        if let Some(metric) = args.metric {
            self.filter.metric = metric;
        }
        if let Some(start) = args.start {
            self.filter.start = Some(start);
        }
        if let Some(end) = args.end {
            self.filter.end = Some(end);
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level for the merged settings; `--quiet` wins over verbosity.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
