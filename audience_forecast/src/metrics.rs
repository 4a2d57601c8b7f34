//! Metrics for evaluating forecast fit

use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which data the metrics were computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricScope {
    /// Fitted values against the training observations
    InSample,
    /// Forecasts against held-out observations
    OutOfSample,
}

impl MetricScope {
    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            MetricScope::InSample => "in-sample fit",
            MetricScope::OutOfSample => "out-of-sample",
        }
    }
}

/// Accuracy metrics for a pair of aligned series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsBundle {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub scope: MetricScope,
}

impl MetricsBundle {
    /// Metrics keyed by their display names
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("RMSE", self.rmse),
            ("MAE", self.mae),
            ("MAPE", self.mape),
            ("R²", self.r2),
        ])
    }
}

impl fmt::Display for MetricsBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE {:.2} | MAE {:.2} | MAPE {:.2}% | R² {:.3} ({})",
            self.rmse,
            self.mae,
            self.mape,
            self.r2,
            self.scope.label()
        )
    }
}

/// Compute RMSE, MAE, MAPE and R² of `predicted` against `actual`.
///
/// Any exactly-zero actual makes MAPE undefined and is reported with its
/// index. Constant actuals give an R² of 1 for a perfect fit and 0 otherwise.
pub fn compute_metrics(actual: &[f64], predicted: &[f64], scope: MetricScope) -> Result<MetricsBundle> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::EmptyData(
            "Cannot compute metrics on empty series".to_string(),
        ));
    }
    if let Some(index) = actual.iter().position(|a| *a == 0.0) {
        return Err(ForecastError::Numeric(format!(
            "MAPE is undefined: actual value at index {} is zero",
            index
        )));
    }

    let n = actual.len() as f64;
    let mut squared = 0.0;
    let mut absolute = 0.0;
    let mut percentage = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        let err = a - p;
        squared += err * err;
        absolute += err.abs();
        percentage += (err / a).abs();
    }

    let mean = actual.iter().sum::<f64>() / n;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = if total == 0.0 {
        if squared == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - squared / total
    };

    let bundle = MetricsBundle {
        rmse: (squared / n).sqrt(),
        mae: absolute / n,
        mape: percentage / n * 100.0,
        r2,
        scope,
    };
    if bundle.as_map().values().any(|v| !v.is_finite()) {
        return Err(ForecastError::Numeric(
            "Metrics are not finite; check for non-finite inputs".to_string(),
        ));
    }

    Ok(bundle)
}
