//! Interactive dashboard session.
//!
//! Reads one command per line, updates the selection and re-renders the
//! report after every change. The dataset is loaded once through the
//! cache and reused for every refresh.

use crate::config::Config;
use crate::dashboard::{self, RefreshOptions};
use crate::data::export::{export_to_file, DEFAULT_EXPORT_FILE};
use crate::data::DatasetCache;
use crate::models::{DateRange, Metric, Selection, Site};
use crate::report;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

const PROMPT: &str = "solardash> ";

const HELP: &str = "\
Commands:
  sites <list>|all      select sites (e.g. sites benin,togo)
  metric <ghi|dni|dhi>  metric for the distribution view
  range <start> <end>   inclusive date range (YYYY-MM-DD)
  start <date>          change the first date
  end <date>            change the last date
  reset                 restore the initial selection
  show                  render the dashboard again
  export [file]         write the filtered rows as CSV
  help                  show this help
  quit                  leave the session";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Sites(BTreeSet<Site>),
    Metric(Metric),
    Range(NaiveDate, NaiveDate),
    Start(NaiveDate),
    End(NaiveDate),
    Reset,
    Show,
    Export(Option<PathBuf>),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("").to_lowercase();
        let rest: Vec<&str> = parts.collect();

        let date = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| format!("Invalid date: {} (expected YYYY-MM-DD)", s))
        };

        match (keyword.as_str(), rest.as_slice()) {
            ("sites", []) => Err("Usage: sites <list>|all".to_string()),
            ("sites", args) => parse_sites(&args.join(" ")).map(Command::Sites),
            ("metric", [m]) => m.parse().map(Command::Metric),
            ("range", [start, end]) => Ok(Command::Range(date(*start)?, date(*end)?)),
            ("start", [d]) => date(*d).map(Command::Start),
            ("end", [d]) => date(*d).map(Command::End),
            ("reset", []) => Ok(Command::Reset),
            ("show", []) => Ok(Command::Show),
            ("export", []) => Ok(Command::Export(None)),
            ("export", [path]) => Ok(Command::Export(Some(PathBuf::from(*path)))),
            ("help" | "?", []) => Ok(Command::Help),
            ("quit" | "exit" | "q", []) => Ok(Command::Quit),
            ("metric" | "range" | "start" | "end" | "reset" | "show" | "export", _) => {
                Err(format!("Wrong arguments for '{}'; type 'help'", keyword))
            }
            _ => Err(format!("Unknown command: {}; type 'help'", keyword)),
        }
    }
}

/// Parse `all`, `none` or a comma-separated site list.
fn parse_sites(value: &str) -> Result<BTreeSet<Site>, String> {
    match value.trim().to_lowercase().as_str() {
        "all" => return Ok(Site::ALL.into_iter().collect()),
        "none" => return Ok(BTreeSet::new()),
        _ => {}
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Site::from_str)
        .collect()
}

/// What the session produced for a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A freshly rendered dashboard.
    Render(String),
    /// A short status or help message.
    Message(String),
    /// The user asked to leave.
    Quit,
}

/// Interactive state: the cache plus the current selection.
pub struct Session<'a> {
    cache: &'a DatasetCache,
    config: &'a Config,
    initial: Selection,
    selection: Selection,
}

impl<'a> Session<'a> {
    /// Start a session; loads the dataset to derive the initial selection.
    pub fn new(cache: &'a DatasetCache, config: &'a Config) -> Result<Self> {
        let dataset = cache.get().context("Failed to load solar datasets")?;
        let initial = dashboard::initial_selection(config, dataset);

        Ok(Self {
            cache,
            config,
            selection: initial.clone(),
            initial,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Apply one command.
    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        debug!("Session command: {:?}", command);

        match command {
            Command::Sites(sites) => self.selection.sites = sites,
            Command::Metric(metric) => self.selection.metric = metric,
            Command::Range(start, end) => self.selection.range = DateRange::new(start, end),
            Command::Start(start) => self.selection.range.start = start,
            Command::End(end) => self.selection.range.end = end,
            Command::Reset => self.selection = self.initial.clone(),
            Command::Show => {}
            Command::Export(path) => return self.export(path),
            Command::Help => return Ok(Reply::Message(HELP.to_string())),
            Command::Quit => return Ok(Reply::Quit),
        }

        self.render().map(Reply::Render)
    }

    /// Render the dashboard for the current selection.
    pub fn render(&self) -> Result<String> {
        let report = dashboard::refresh(
            self.cache,
            &self.selection,
            RefreshOptions::from(self.config),
        )?;
        report::render(
            &report,
            self.config.report.format,
            self.config.report.bar_width,
        )
    }

    fn export(&self, path: Option<PathBuf>) -> Result<Reply> {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
        let dataset = self.cache.get()?;
        let view = dashboard::apply_selection(dataset, &self.selection);

        export_to_file(&view, &path)?;

        Ok(Reply::Message(format!(
            "📥 Exported {} rows to {}",
            view.len(),
            path.display()
        )))
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        writeln!(output, "{}", self.render()?)?;
        writeln!(output, "Type 'help' for commands.")?;

        let mut lines = input.lines();
        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(output, "{}", e)?;
                    continue;
                }
            };

            match self.execute(command) {
                Ok(Reply::Render(text)) | Ok(Reply::Message(text)) => {
                    writeln!(output, "{}", text)?
                }
                Ok(Reply::Quit) => break,
                Err(e) => writeln!(output, "Error: {:#}", e)?,
            }
        }

        info!("Session ended (sites: {})", self.selection().sites_label());
        Ok(())
    }
}
