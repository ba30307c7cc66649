//! Pearson correlation matrix over measurement columns.

use crate::data::FilteredView;
use crate::models::{Column, CorrelationMatrix};

/// Pairwise Pearson correlations of the given columns.
///
/// Only rows with a valid value in every column take part. The diagonal is
/// 1.0; an off-diagonal cell is `None` when fewer than two complete rows
/// exist or either column is constant.
pub fn correlation_matrix(view: &FilteredView<'_>, columns: &[Column]) -> CorrelationMatrix {
    let series: Vec<Vec<f64>> = {
        let complete: Vec<_> = view
            .rows
            .iter()
            .filter(|r| columns.iter().all(|c| !r.readings.get(*c).is_nan()))
            .collect();

        columns
            .iter()
            .map(|c| complete.iter().map(|r| r.readings.get(*c)).collect())
            .collect()
    };
    let complete_rows = series.first().map(Vec::len).unwrap_or_default();

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.to_vec(),
        values,
        complete_rows,
    }
}

/// Pearson coefficient of two equally long series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let numerator: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let sum_sq_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let sum_sq_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        return None;
    }

    Some((numerator / denominator).clamp(-1.0, 1.0))
}
