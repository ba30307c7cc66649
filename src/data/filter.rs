//! Narrowing the combined dataset to the user's selection.

use crate::models::{CombinedDataset, DateRange, Observation, Site};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A borrowed subset of the combined dataset.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    /// Columns of the underlying dataset (without `Site`).
    pub columns: &'a [String],
    /// Matching rows, in dataset order.
    pub rows: Vec<&'a Observation>,
}

impl<'a> FilteredView<'a> {
    /// A view over every row of the dataset.
    #[cfg(test)]
    pub fn all(dataset: &'a CombinedDataset) -> Self {
        Self {
            columns: &dataset.columns,
            rows: dataset.rows.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct sites present in the view.
    pub fn sites(&self) -> BTreeSet<Site> {
        self.rows.iter().map(|r| r.site).collect()
    }
}

/// Keep rows whose site is selected and whose date lies within the range.
///
/// An empty site set or an inverted range yields an empty view.
pub fn filter<'a>(
    dataset: &'a CombinedDataset,
    sites: &BTreeSet<Site>,
    range: &DateRange,
) -> FilteredView<'a> {
    if sites.is_empty() {
        warn!("No sites selected; the filtered view is empty");
    }
    if range.is_inverted() {
        warn!("Start date {} is after end date {}", range.start, range.end);
    }

    let rows: Vec<&Observation> = dataset
        .rows
        .iter()
        .filter(|row| sites.contains(&row.site) && range.contains(&row.timestamp))
        .collect();

    debug!(
        "Filter kept {}/{} rows ({} / {})",
        rows.len(),
        dataset.len(),
        sites.iter().map(Site::label).collect::<Vec<_>>().join(", "),
        range
    );

    FilteredView {
        columns: &dataset.columns,
        rows,
    }
}
