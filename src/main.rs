//! Solardash - Solar Data Comparison Dashboard
//!
//! A CLI tool that loads the cleaned solar measurement datasets of
//! Benin, Sierra Leone and Togo, filters them by site and date, and
//! reports summary statistics, a GHI ranking, correlations and a
//! one-way ANOVA.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, missing or malformed data, export failure)

mod analysis;
mod cli;
mod config;
mod dashboard;
mod data;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use dashboard::RefreshOptions;
use data::{DataSources, DatasetCache, LoadOptions};
use session::Session;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Solardash v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_origin);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, config) {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .solardash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your data directory and set default filters.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the dashboard once, or start an interactive session.
fn run(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let sources = DataSources::from_config(&config.data);
    let cache = DatasetCache::new(
        sources,
        LoadOptions {
            show_progress: !args.quiet,
        },
    );

    if args.interactive {
        let mut session = Session::new(&cache, &config)?;
        let stdin = std::io::stdin();
        return session.run(stdin.lock(), std::io::stdout());
    }

    // Step 1: Load the datasets
    if !args.quiet {
        eprintln!("📥 Loading data from {}", config.data.dir.display());
    }
    let dataset = cache.get().context("Failed to load solar datasets")?;

    // Step 2: Filter
    let selection = dashboard::initial_selection(&config, dataset);
    info!(
        "Selection: sites [{}], metric {}, {}",
        selection.sites_label(),
        selection.metric,
        selection.range
    );
    let view = dashboard::apply_selection(dataset, &selection);

    // Step 3: Analytics
    let report = dashboard::build_report(
        dataset,
        &view,
        &selection,
        cache.sources().describe(),
        RefreshOptions::from(&config),
    );

    if !args.quiet {
        let ranked: Vec<&str> = report.ranking.sites().iter().map(|s| s.label()).collect();
        eprintln!("🏆 GHI ranking: {}", ranked.join(" > "));
        if let Some(p) = report.anova.p_value() {
            eprintln!("📊 ANOVA p-value (GHI): {:.4}", p);
        }
    }

    // Step 4: Render
    let output = report::render(&report, config.report.format, config.report.bar_width)?;
    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    // Step 5: Optional export
    if let Some(ref path) = args.export {
        data::export::export_to_file(&view, path)?;
        if !args.quiet {
            eprintln!("📥 Exported {} filtered rows to {}", view.len(), path.display());
        }
    }

    debug!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so it returns a description of where
/// the settings came from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}; using defaults", CONFIG_FILE, e);
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
