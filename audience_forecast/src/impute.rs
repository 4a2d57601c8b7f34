//! K-nearest-neighbour imputation of the numeric block
//!
//! Missing cells are filled with the mean of the same column over the `k`
//! nearest rows that observe it. Distances are nan-euclidean over the raw
//! (unscaled) values, so every column contributes in its own units.

use crate::error::{ForecastError, Result};
use audience_math::distance::nan_euclidean;
use std::cmp::Ordering;

/// Fills gaps in a dense numeric block from its nearest complete neighbours
#[derive(Debug, Clone)]
pub struct KnnImputer {
    n_neighbors: usize,
}

impl KnnImputer {
    /// Create an imputer averaging over `n_neighbors` donors
    pub fn new(n_neighbors: usize) -> Result<Self> {
        if n_neighbors == 0 {
            return Err(ForecastError::InvalidParameter(
                "KNN imputer needs at least one neighbour".to_string(),
            ));
        }
        Ok(Self { n_neighbors })
    }

    /// Number of donors averaged per missing cell
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Fit on `rows` and fill every missing cell in one pass.
    ///
    /// `columns` names the block's columns for error reporting; every row
    /// must have one cell per column.
    pub fn fit_transform(
        &self,
        columns: &[&str],
        rows: &[Vec<Option<f64>>],
    ) -> Result<Vec<Vec<f64>>> {
        let width = columns.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(ForecastError::DimensionMismatch {
                expected: width,
                got: rows[bad].len(),
            });
        }

        let means = column_means(columns, rows)?;
        let mut filled = Vec::with_capacity(rows.len());
        let mut fallbacks = 0usize;

        for (i, row) in rows.iter().enumerate() {
            if row.iter().all(Option::is_some) {
                filled.push(row.iter().map(|v| v.unwrap_or_default()).collect());
                continue;
            }

            let distances: Vec<Option<f64>> = rows
                .iter()
                .enumerate()
                .map(|(j, other)| if i == j { None } else { nan_euclidean(row, other) })
                .collect();

            let mut out = Vec::with_capacity(width);
            for (c, cell) in row.iter().enumerate() {
                if let Some(v) = cell {
                    out.push(*v);
                    continue;
                }

                let mut donors: Vec<(f64, usize)> = distances
                    .iter()
                    .enumerate()
                    .filter_map(|(j, d)| match (d, rows[j][c]) {
                        (Some(d), Some(_)) => Some((*d, j)),
                        _ => None,
                    })
                    .collect();

                if donors.is_empty() {
                    fallbacks += 1;
                    out.push(means[c]);
                    continue;
                }

                donors.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(Ordering::Equal)
                        .then(a.1.cmp(&b.1))
                });
                donors.truncate(self.n_neighbors);
                let sum: f64 = donors.iter().filter_map(|&(_, j)| rows[j][c]).sum();
                out.push(sum / donors.len() as f64);
            }
            filled.push(out);
        }

        if fallbacks > 0 {
            log::warn!(
                "{} missing cell(s) had no neighbour sharing an observed column; used column means",
                fallbacks
            );
        }

        Ok(filled)
    }
}

fn column_means(columns: &[&str], rows: &[Vec<Option<f64>>]) -> Result<Vec<f64>> {
    columns
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let observed: Vec<f64> = rows.iter().filter_map(|r| r[c]).collect();
            if observed.is_empty() {
                return Err(ForecastError::Numeric(format!(
                    "Column '{}' has no observed values to impute from",
                    name
                )));
            }
            Ok(observed.iter().sum::<f64>() / observed.len() as f64)
        })
        .collect()
}
