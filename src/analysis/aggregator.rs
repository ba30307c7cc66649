//! Per-site aggregation and descriptive statistics.
//!
//! This module groups a filtered view by site and computes the summary
//! table, the site ranking and the distribution summaries.

use crate::data::FilteredView;
use crate::models::{
    Column, ColumnStats, DistributionSummary, Metric, Observation, RankEntry, Ranking, Site,
    SiteSummary, SummaryTable,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Group rows by site; sites are ordered Benin, Sierra Leone, Togo.
pub fn group_by_site<'a>(view: &FilteredView<'a>) -> BTreeMap<Site, Vec<&'a Observation>> {
    let mut grouped: BTreeMap<Site, Vec<&'a Observation>> = BTreeMap::new();

    for row in &view.rows {
        grouped.entry(row.site).or_default().push(*row);
    }

    grouped
}

/// Non-missing values of a column within a group.
pub fn column_values(rows: &[&Observation], column: Column) -> Vec<f64> {
    rows.iter()
        .map(|r| r.readings.get(column))
        .filter(|v| !v.is_nan())
        .collect()
}

/// Mean, median and standard deviation of each irradiance column per site,
/// rounded to 2 decimals. Sites with no rows are absent.
pub fn summarize(view: &FilteredView<'_>) -> SummaryTable {
    let rows = group_by_site(view)
        .into_iter()
        .map(|(site, rows)| {
            let stats = |column| describe(&column_values(&rows, column));
            SiteSummary {
                site,
                count: rows.len(),
                ghi: stats(Column::Ghi),
                dni: stats(Column::Dni),
                dhi: stats(Column::Dhi),
            }
        })
        .collect();

    SummaryTable { rows }
}

/// Rounded mean/median/sample standard deviation of a set of values.
pub fn describe(values: &[f64]) -> ColumnStats {
    ColumnStats {
        mean: mean(values).map(round2),
        median: median(values).map(round2),
        std: std_dev(values).map(round2),
    }
}

/// Rank sites by the mean of a column, highest first.
///
/// Ties keep site order; sites whose mean is undefined come last.
pub fn rank_by_site(view: &FilteredView<'_>, column: Column) -> Ranking {
    let mut entries: Vec<RankEntry> = group_by_site(view)
        .into_iter()
        .map(|(site, rows)| RankEntry {
            site,
            mean: mean(&column_values(&rows, column)),
            count: rows.len(),
        })
        .collect();

    // Stable sort: equal means stay in site order.
    entries.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ranking { column, entries }
}

/// Five-number summary of the metric for every site with valid values.
pub fn distribution(view: &FilteredView<'_>, metric: Metric) -> Vec<DistributionSummary> {
    group_by_site(view)
        .into_iter()
        .filter_map(|(site, rows)| {
            let mut values = column_values(&rows, metric.column());
            if values.is_empty() {
                return None;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

            Some(DistributionSummary {
                site,
                count: values.len(),
                min: values[0],
                q1: quantile_sorted(&values, 0.25),
                median: quantile_sorted(&values, 0.5),
                q3: quantile_sorted(&values, 0.75),
                max: values[values.len() - 1],
            })
        })
        .collect()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(quantile_sorted(&sorted, 0.5))
}

/// Sample standard deviation (n - 1); `None` with fewer than two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CombinedDataset, Readings};
    use chrono::NaiveDate;

    fn obs(site: Site, ghi: f64) -> Observation {
        Observation {
            site,
            timestamp: NaiveDate::from_ymd_opt(2021, 8, 9)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            readings: Readings::from_fn(|c| match c {
                Column::Ghi => ghi,
                Column::Dni => ghi / 2.0,
                _ => 1.0,
            }),
            fields: vec![],
        }
    }

    fn dataset(rows: Vec<Observation>) -> CombinedDataset {
        CombinedDataset {
            columns: vec![],
            rows,
        }
    }

    #[test]
    fn test_group_by_site() {
        let data = dataset(vec![
            obs(Site::Togo, 1.0),
            obs(Site::Benin, 2.0),
            obs(Site::Togo, 3.0),
        ]);
        let view = FilteredView::all(&data);

        let grouped = group_by_site(&view);

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![Site::Benin, Site::Togo]);
        assert_eq!(grouped.get(&Site::Togo).map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_summarize_matches_direct_computation() {
        let data = dataset(vec![
            obs(Site::Benin, 1.0),
            obs(Site::Benin, 2.0),
            obs(Site::Benin, 4.0),
            obs(Site::SierraLeone, 10.0),
        ]);
        let view = FilteredView::all(&data);

        let table = summarize(&view);

        assert_eq!(table.rows.len(), 2);
        assert!(table.get(Site::Togo).is_none());

        let benin = table.get(Site::Benin).unwrap();
        assert_eq!(benin.count, 3);
        assert_eq!(benin.ghi.mean, Some(2.33));
        assert_eq!(benin.ghi.median, Some(2.0));
        // sqrt(((1-7/3)^2 + (2-7/3)^2 + (4-7/3)^2) / 2) = 1.5275...
        assert_eq!(benin.ghi.std, Some(1.53));
        assert_eq!(benin.dni.mean, Some(1.17));

        let sierra = table.get(Site::SierraLeone).unwrap();
        assert_eq!(sierra.ghi.mean, Some(10.0));
        assert_eq!(sierra.ghi.std, None);
    }

    #[test]
    fn test_summarize_skips_missing_values() {
        let data = dataset(vec![obs(Site::Togo, f64::NAN), obs(Site::Togo, 6.0)]);
        let table = summarize(&FilteredView::all(&data));

        let togo = table.get(Site::Togo).unwrap();
        assert_eq!(togo.count, 2);
        assert_eq!(togo.ghi.mean, Some(6.0));
    }

    #[test]
    fn test_summarize_empty_view() {
        let data = dataset(vec![]);
        assert!(summarize(&FilteredView::all(&data)).is_empty());
    }

    #[test]
    fn test_rank_by_site_descending() {
        let data = dataset(vec![
            obs(Site::Benin, 500.0),
            obs(Site::SierraLeone, 300.0),
            obs(Site::SierraLeone, 310.0),
            obs(Site::Togo, 400.0),
        ]);
        let view = FilteredView::all(&data);

        let ranking = rank_by_site(&view, Column::Ghi);

        assert_eq!(ranking.sites(), vec![Site::Benin, Site::Togo, Site::SierraLeone]);
        assert_eq!(ranking.entries[2].mean, Some(305.0));
        let total: usize = ranking.entries.iter().map(|e| e.count).sum();
        assert_eq!(total, view.len());
    }

    #[test]
    fn test_rank_ties_keep_site_order() {
        let data = dataset(vec![
            obs(Site::Togo, 100.0),
            obs(Site::SierraLeone, 100.0),
            obs(Site::Benin, 100.0),
        ]);

        let ranking = rank_by_site(&FilteredView::all(&data), Column::Ghi);

        assert_eq!(ranking.sites(), vec![Site::Benin, Site::SierraLeone, Site::Togo]);
    }

    #[test]
    fn test_rank_undefined_mean_sorts_last() {
        let data = dataset(vec![obs(Site::Benin, f64::NAN), obs(Site::Togo, -5.0)]);

        let ranking = rank_by_site(&FilteredView::all(&data), Column::Ghi);

        assert_eq!(ranking.sites(), vec![Site::Togo, Site::Benin]);
        assert_eq!(ranking.entries[1].mean, None);
        assert_eq!(ranking.entries[1].count, 1);
    }

    #[test]
    fn test_distribution_quartiles() {
        let data = dataset((1..=5).map(|v| obs(Site::Benin, v as f64)).collect());

        let dist = distribution(&FilteredView::all(&data), Metric::Ghi);

        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].min, 1.0);
        assert_eq!(dist[0].q1, 2.0);
        assert_eq!(dist[0].median, 3.0);
        assert_eq!(dist[0].q3, 4.0);
        assert_eq!(dist[0].max, 5.0);
    }

    #[test]
    fn test_distribution_reads_selected_metric() {
        let mut rows: Vec<Observation> = (1..=5).map(|v| obs(Site::Benin, v as f64)).collect();
        rows.extend((1..=3).map(|v| obs(Site::Togo, v as f64 * 10.0)));
        let data = dataset(rows);
        let view = FilteredView::all(&data);

        let dni = distribution(&view, Metric::Dni);
        assert_eq!(dni.len(), 2);
        assert_eq!(dni[0].site, Site::Benin);
        assert_eq!(dni[0].min, 0.5);
        assert_eq!(dni[0].median, 1.5);
        assert_eq!(dni[0].max, 2.5);
        assert_eq!(dni[1].site, Site::Togo);
        assert_eq!(dni[1].median, 10.0);
        assert_eq!(dni[1].max, 15.0);

        let dhi = distribution(&view, Metric::Dhi);
        assert_eq!(dhi[0].min, 1.0);
        assert_eq!(dhi[0].max, 1.0);
        assert_eq!(dhi[1].count, 3);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile_sorted(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(quantile_sorted(&[7.0], 0.25), 7.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(-0.004), -0.0);
    }
}
