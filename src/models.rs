//! Data models for the solar dashboard.
//!
//! This module contains the core data structures used throughout
//! the application for representing observations, selections, computed
//! statistics, and reports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name of the column appended to every row to identify its site.
pub const SITE_COLUMN: &str = "Site";

/// Name of the timestamp column every source must carry.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// One of the three measurement sites being compared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    Benin,
    SierraLeone,
    Togo,
}

impl Site {
    /// All sites, in source (and display) order.
    pub const ALL: [Site; 3] = [Site::Benin, Site::SierraLeone, Site::Togo];

    /// Human-readable label, as written into the `Site` column.
    pub fn label(&self) -> &'static str {
        match self {
            Site::Benin => "Benin",
            Site::SierraLeone => "Sierra Leone",
            Site::Togo => "Togo",
        }
    }

    /// Returns an emoji flag for the site.
    pub fn flag(&self) -> &'static str {
        match self {
            Site::Benin => "🇧🇯",
            Site::SierraLeone => "🇸🇱",
            Site::Togo => "🇹🇬",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        match normalized.as_str() {
            "benin" => Ok(Site::Benin),
            "sierraleone" => Ok(Site::SierraLeone),
            "togo" => Ok(Site::Togo),
            _ => Err(format!("Unknown site: {}", s.trim())),
        }
    }
}

/// A statically declared numeric measurement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "GHI")]
    Ghi,
    #[serde(rename = "DNI")]
    Dni,
    #[serde(rename = "DHI")]
    Dhi,
    #[serde(rename = "Tamb")]
    Tamb,
    #[serde(rename = "RH")]
    Rh,
    #[serde(rename = "WS")]
    Ws,
    #[serde(rename = "WSgust")]
    WsGust,
}

impl Column {
    /// Every column a source file must provide (besides `Timestamp`).
    pub const ALL: [Column; 7] = [
        Column::Ghi,
        Column::Dni,
        Column::Dhi,
        Column::Tamb,
        Column::Rh,
        Column::Ws,
        Column::WsGust,
    ];

    /// The irradiance components summarized per site.
    pub const IRRADIANCE: [Column; 3] = [Column::Ghi, Column::Dni, Column::Dhi];

    /// Header name of the column in the source files.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Ghi => "GHI",
            Column::Dni => "DNI",
            Column::Dhi => "DHI",
            Column::Tamb => "Tamb",
            Column::Rh => "RH",
            Column::Ws => "WS",
            Column::WsGust => "WSgust",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Irradiance metric selectable for the distribution view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Global Horizontal Irradiance (default)
    #[default]
    Ghi,
    /// Direct Normal Irradiance
    Dni,
    /// Diffuse Horizontal Irradiance
    Dhi,
}

impl Metric {
    /// The measurement column backing this metric.
    pub fn column(&self) -> Column {
        match self {
            Metric::Ghi => Column::Ghi,
            Metric::Dni => Column::Dni,
            Metric::Dhi => Column::Dhi,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column().name())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ghi" => Ok(Metric::Ghi),
            "dni" => Ok(Metric::Dni),
            "dhi" => Ok(Metric::Dhi),
            other => Err(format!("Unknown metric: {} (expected GHI, DNI or DHI)", other)),
        }
    }
}

/// Typed measurement values of one observation.
///
/// Cells that are empty or not numeric are stored as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub ghi: f64,
    pub dni: f64,
    pub dhi: f64,
    pub tamb: f64,
    pub rh: f64,
    pub ws: f64,
    pub ws_gust: f64,
}

impl Readings {
    /// Returns the value of the given column.
    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::Ghi => self.ghi,
            Column::Dni => self.dni,
            Column::Dhi => self.dhi,
            Column::Tamb => self.tamb,
            Column::Rh => self.rh,
            Column::Ws => self.ws,
            Column::WsGust => self.ws_gust,
        }
    }

    /// Builds readings from a lookup function over columns.
    pub fn from_fn(mut value: impl FnMut(Column) -> f64) -> Self {
        Self {
            ghi: value(Column::Ghi),
            dni: value(Column::Dni),
            dhi: value(Column::Dhi),
            tamb: value(Column::Tamb),
            rh: value(Column::Rh),
            ws: value(Column::Ws),
            ws_gust: value(Column::WsGust),
        }
    }
}

/// One sampled instant at one site.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Site the row came from.
    pub site: Site,
    /// Parsed `Timestamp` cell.
    pub timestamp: NaiveDateTime,
    /// Typed measurement values.
    pub readings: Readings,
    /// Raw text of every source cell, aligned with the dataset's columns.
    pub fields: Vec<String>,
}

/// All sites' rows concatenated, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedDataset {
    /// Union of the source headers, in first-seen order (without `Site`).
    pub columns: Vec<String>,
    /// Observations, Benin rows first, then Sierra Leone, then Togo.
    pub rows: Vec<Observation>,
}

impl CombinedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Earliest and latest timestamp in the dataset.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.rows.iter().map(|r| r.timestamp).min()?;
        let max = self.rows.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }

    /// Number of rows contributed by the given site.
    pub fn count_for(&self, site: Site) -> usize {
        self.rows.iter().filter(|r| r.site == site).count()
    }
}

/// Inclusive calendar-date interval used to filter observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The smallest range that contains every row of the dataset.
    pub fn spanning(dataset: &CombinedDataset) -> Option<Self> {
        dataset
            .time_span()
            .map(|(min, max)| Self::new(min.date(), max.date()))
    }

    /// Whether the instant falls on a date within the range.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start <= date && date <= self.end
    }

    /// Whether the range is inverted (and therefore matches nothing).
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// The user's current dashboard parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected sites.
    pub sites: BTreeSet<Site>,
    /// Metric shown in the distribution view.
    pub metric: Metric,
    /// Inclusive date range.
    pub range: DateRange,
}

impl Selection {
    /// Whether every known site is selected (the ANOVA precondition).
    pub fn has_all_sites(&self) -> bool {
        Site::ALL.iter().all(|s| self.sites.contains(s))
    }

    /// Comma-separated site labels, or `(none)`.
    pub fn sites_label(&self) -> String {
        if self.sites.is_empty() {
            return "(none)".to_string();
        }
        self.sites
            .iter()
            .map(Site::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Mean, median and standard deviation of one column at one site.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
}

/// Irradiance statistics of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub site: Site,
    /// Number of rows in the group.
    pub count: usize,
    pub ghi: ColumnStats,
    pub dni: ColumnStats,
    pub dhi: ColumnStats,
}

impl SiteSummary {
    /// Statistics of the given irradiance column.
    pub fn stats(&self, column: Column) -> Option<&ColumnStats> {
        match column {
            Column::Ghi => Some(&self.ghi),
            Column::Dni => Some(&self.dni),
            Column::Dhi => Some(&self.dhi),
            _ => None,
        }
    }
}

/// Grouped summary statistics; sites without rows are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryTable {
    pub rows: Vec<SiteSummary>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, site: Site) -> Option<&SiteSummary> {
        self.rows.iter().find(|r| r.site == site)
    }
}

/// One line of the site ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub site: Site,
    /// Mean of the ranked column; `None` when the group has no valid values.
    pub mean: Option<f64>,
    /// Number of rows in the group.
    pub count: usize,
}

/// Sites ordered by the mean of one column, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub column: Column,
    pub entries: Vec<RankEntry>,
}

impl Ranking {
    /// Sites in ranked order.
    pub fn sites(&self) -> Vec<Site> {
        self.entries.iter().map(|e| e.site).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pairwise Pearson correlations over a set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    /// Row-major; `None` where the coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
    /// Number of rows with a valid value in every column.
    pub complete_rows: usize,
}

impl CorrelationMatrix {
    /// Coefficient between two columns, if both are in the matrix.
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

/// Five-number summary of one metric at one site (the data behind a box plot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub site: Site,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Result of a one-way analysis of variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: usize,
    pub df_within: usize,
}

/// What the dashboard could say about the ANOVA for this refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnovaOutcome {
    /// Not all three sites are selected.
    Skipped,
    /// The data did not meet the test's preconditions.
    Unavailable { reason: String },
    /// The test ran.
    Computed(AnovaResult),
}

impl AnovaOutcome {
    pub fn p_value(&self) -> Option<f64> {
        match self {
            AnovaOutcome::Computed(result) => Some(result.p_value),
            _ => None,
        }
    }
}

/// Metadata about a dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Source files the dataset was loaded from.
    pub sources: Vec<String>,
    /// Rows in the combined dataset.
    pub total_rows: usize,
    /// Rows left after filtering.
    pub filtered_rows: usize,
    /// Significance level used to label the ANOVA.
    pub alpha: f64,
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub selection: Selection,
    pub distribution: Vec<DistributionSummary>,
    pub summary: SummaryTable,
    pub ranking: Ranking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
    pub anova: AnovaOutcome,
}
