//! One-way analysis of variance across the three sites.

use super::aggregator::{column_values, group_by_site, mean};
use crate::data::FilteredView;
use crate::models::{AnovaResult, Column, Site};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use thiserror::Error;
use tracing::debug;

/// Reasons the test cannot be computed on the given data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("expected {expected} site groups, found {found}")]
    GroupCount { expected: usize, found: usize },

    #[error("{site} has {count} GHI observation(s); at least 2 are required")]
    TooFewObservations { site: Site, count: usize },

    #[error("group {index} has {count} observation(s); at least 2 are required")]
    GroupTooSmall { index: usize, count: usize },

    #[error("all GHI values are identical; the F statistic is undefined")]
    ConstantInput,

    #[error("invalid F distribution: {0}")]
    Distribution(String),
}

/// Test whether mean GHI differs across the three sites.
///
/// Requires exactly one group per site with at least two valid GHI values
/// each. Missing values are dropped before testing.
pub fn anova(view: &FilteredView<'_>) -> Result<AnovaResult, StatsError> {
    let grouped = group_by_site(view);

    if grouped.len() != Site::ALL.len() {
        return Err(StatsError::GroupCount {
            expected: Site::ALL.len(),
            found: grouped.len(),
        });
    }

    let mut groups = Vec::with_capacity(grouped.len());
    for (site, rows) in &grouped {
        let values = column_values(rows, Column::Ghi);
        if values.len() < 2 {
            return Err(StatsError::TooFewObservations {
                site: *site,
                count: values.len(),
            });
        }
        groups.push(values);
    }

    one_way_anova(&groups)
}

/// One-way ANOVA F test over any number (≥ 2) of groups.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<AnovaResult, StatsError> {
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::GroupCount {
            expected: 2,
            found: k,
        });
    }
    if let Some((index, group)) = groups.iter().enumerate().find(|(_, g)| g.len() < 2) {
        return Err(StatsError::GroupTooSmall {
            index,
            count: group.len(),
        });
    }

    // Decided from the raw values; the sums of squares carry rounding error.
    if groups.iter().all(|g| g.iter().all(|v| *v == g[0])) {
        if groups.iter().flatten().all(|v| *v == groups[0][0]) {
            return Err(StatsError::ConstantInput);
        }
        let n: usize = groups.iter().map(Vec::len).sum();
        return Ok(AnovaResult {
            f_statistic: f64::INFINITY,
            p_value: 0.0,
            df_between: k - 1,
            df_within: n - k,
        });
    }

    let n: usize = groups.iter().map(Vec::len).sum();
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let grand_mean = mean(&all).unwrap_or_default();

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let group_mean = mean(group).unwrap_or_default();
        ss_between += group.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n - k;

    debug!(
        "ANOVA: ss_between={:.4}, ss_within={:.4}, df=({}, {})",
        ss_between, ss_within, df_between, df_within
    );

    let f_statistic =
        (ss_between / df_between as f64) / (ss_within / df_within as f64);

    let f_dist = FisherSnedecor::new(df_between as f64, df_within as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = f_dist.sf(f_statistic).clamp(0.0, 1.0);

    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
    })
}
