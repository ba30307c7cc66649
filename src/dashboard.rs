//! One dashboard refresh: filter the cached dataset and run the analytics.

use crate::analysis::{self, anova};
use crate::config::Config;
use crate::data::{filter, DatasetCache, FilteredView};
use crate::models::{
    AnovaOutcome, Column, CombinedDataset, DashboardReport, DateRange, ReportMetadata, Selection,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

/// Settings that shape a refresh but are not part of the selection.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    pub include_correlation: bool,
    pub include_distribution: bool,
    pub alpha: f64,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            include_correlation: true,
            include_distribution: true,
            alpha: 0.05,
        }
    }
}

impl From<&Config> for RefreshOptions {
    fn from(config: &Config) -> Self {
        Self {
            include_correlation: config.report.include_correlation,
            include_distribution: config.report.include_distribution,
            alpha: config.report.alpha,
        }
    }
}

/// Build the initial selection from configuration, filling open date
/// bounds from the dataset's span.
pub fn initial_selection(config: &Config, dataset: &CombinedDataset) -> Selection {
    let span = DateRange::spanning(dataset);
    let fallback = NaiveDate::default();

    let start = config
        .filter
        .start
        .or(span.map(|r| r.start))
        .unwrap_or(fallback);
    let end = config
        .filter
        .end
        .or(span.map(|r| r.end))
        .unwrap_or(fallback);

    Selection {
        sites: config.filter.sites.iter().copied().collect(),
        metric: config.filter.metric,
        range: DateRange::new(start, end),
    }
}

/// Filter the dataset according to a selection.
pub fn apply_selection<'a>(dataset: &'a CombinedDataset, selection: &Selection) -> FilteredView<'a> {
    filter(dataset, &selection.sites, &selection.range)
}

/// Run the ANOVA only when every site is selected; failures become
/// `Unavailable` instead of errors.
pub fn guarded_anova(view: &FilteredView<'_>, selection: &Selection) -> AnovaOutcome {
    if !selection.has_all_sites() {
        debug!("ANOVA skipped: {} site(s) selected", selection.sites.len());
        return AnovaOutcome::Skipped;
    }

    match anova(view) {
        Ok(result) => {
            info!(
                "ANOVA (GHI): F = {:.3}, p = {:.4}",
                result.f_statistic, result.p_value
            );
            AnovaOutcome::Computed(result)
        }
        Err(e) => {
            warn!("ANOVA not available: {}", e);
            AnovaOutcome::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Compute every dashboard panel for a filtered view.
pub fn build_report(
    dataset: &CombinedDataset,
    view: &FilteredView<'_>,
    selection: &Selection,
    sources: Vec<String>,
    options: RefreshOptions,
) -> DashboardReport {
    if view.is_empty() {
        warn!("No rows match the current selection");
    } else {
        let present = view.sites();
        for site in selection.sites.iter().filter(|s| !present.contains(s)) {
            warn!("No rows for {} in {}", site, selection.range);
        }
    }

    let distribution = if options.include_distribution {
        analysis::distribution(view, selection.metric)
    } else {
        Vec::new()
    };

    let correlation = options
        .include_correlation
        .then(|| analysis::correlation_matrix(view, &Column::ALL));

    DashboardReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            sources,
            total_rows: dataset.len(),
            filtered_rows: view.len(),
            alpha: options.alpha,
        },
        selection: selection.clone(),
        distribution,
        summary: analysis::summarize(view),
        ranking: analysis::rank_by_site(view, Column::Ghi),
        correlation,
        anova: guarded_anova(view, selection),
    }
}

/// Load (or reuse) the dataset and compute the report for a selection.
pub fn refresh(
    cache: &DatasetCache,
    selection: &Selection,
    options: RefreshOptions,
) -> Result<DashboardReport> {
    let dataset = cache.get().context("Failed to load solar datasets")?;
    let view = apply_selection(dataset, selection);
    Ok(build_report(
        dataset,
        &view,
        selection,
        cache.sources().describe(),
        options,
    ))
}
