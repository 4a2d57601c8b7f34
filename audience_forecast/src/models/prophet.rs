//! Additive trend-plus-seasonality model in the style of Prophet
//!
//! The fit is a single penalized least-squares solve:
//!
//! - piecewise-linear trend on time scaled to `[0, 1]`, with potential
//!   changepoints spread over the first 80% of the history
//! - Fourier seasonality (yearly order 10, weekly order 3, daily order 4)
//!   evaluated on days since the Unix epoch
//!
//! Changepoint deltas and Fourier weights carry ridge penalties derived from
//! their prior scales; the intercept and base slope are unpenalized. The
//! target is divided by its absolute maximum before fitting.

use crate::error::{ForecastError, Result};
use crate::features::ModelingFrame;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use audience_math::linalg::ridge_least_squares;
use chrono::{Duration, NaiveDateTime};
use std::f64::consts::PI;

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Assumed noise scale of the normalized target
const OBSERVATION_SCALE: f64 = 0.05;

/// One Fourier seasonality block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    /// Period in days
    pub period: f64,
    /// Number of sine/cosine pairs
    pub order: usize,
}

/// Prophet-style additive model
#[derive(Debug, Clone)]
pub struct ProphetModel {
    name: String,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    seasonalities: Vec<Seasonality>,
}

/// Trained Prophet-style model
#[derive(Debug, Clone)]
pub struct TrainedProphetModel {
    name: String,
    start: NaiveDateTime,
    last: NaiveDateTime,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    beta: Vec<f64>,
    fitted: Vec<f64>,
    residual_variance: f64,
}

impl Default for ProphetModel {
    fn default() -> Self {
        Self {
            name: "Prophet".to_string(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            seasonalities: vec![
                Seasonality {
                    period: 365.25,
                    order: 10,
                },
                Seasonality {
                    period: 7.0,
                    order: 3,
                },
                Seasonality {
                    period: 1.0,
                    order: 4,
                },
            ],
        }
    }
}

impl ProphetModel {
    /// Set the maximum number of trend changepoints
    pub fn with_changepoints(mut self, n_changepoints: usize) -> Self {
        self.n_changepoints = n_changepoints;
        self
    }

    /// Replace the seasonal blocks
    pub fn with_seasonalities(mut self, seasonalities: Vec<Seasonality>) -> Self {
        self.seasonalities = seasonalities;
        self
    }

    /// Changepoint timestamps at evenly spaced rows of the leading history
    fn changepoint_rows(&self, n: usize) -> Vec<usize> {
        let hist = ((n as f64) * self.changepoint_range).floor() as usize;
        let count = self.n_changepoints.min(hist.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (hist - 1) as f64;
        let mut rows: Vec<usize> = (1..=count)
            .map(|i| (last * i as f64 / count as f64).round() as usize)
            .collect();
        rows.dedup();
        rows
    }

    fn penalties(&self, n_changepoints: usize) -> Vec<f64> {
        let changepoint = (OBSERVATION_SCALE / self.changepoint_prior_scale).powi(2);
        let seasonal = (OBSERVATION_SCALE / self.seasonality_prior_scale).powi(2);
        let fourier: usize = self.seasonalities.iter().map(|s| 2 * s.order).sum();

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(changepoint).take(n_changepoints));
        penalties.extend(std::iter::repeat(seasonal).take(fourier));
        penalties
    }
}

fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Days since the Unix epoch
fn epoch_days(ts: NaiveDateTime) -> f64 {
    days_between(NaiveDateTime::default(), ts)
}

impl TrainedProphetModel {
    fn design_row(
        start: NaiveDateTime,
        span_days: f64,
        changepoints: &[f64],
        seasonalities: &[Seasonality],
        ts: NaiveDateTime,
    ) -> Vec<f64> {
        let t = days_between(start, ts) / span_days;
        let mut row = vec![1.0, t];
        row.extend(changepoints.iter().map(|c| (t - c).max(0.0)));

        let days = epoch_days(ts);
        for s in seasonalities {
            for k in 1..=s.order {
                let angle = 2.0 * PI * k as f64 * days / s.period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
        row
    }

    /// Model value at `ts` on the original scale
    fn predict_at(&self, ts: NaiveDateTime) -> f64 {
        let row = Self::design_row(
            self.start,
            self.span_days,
            &self.changepoints,
            &self.seasonalities,
            ts,
        );
        row.iter().zip(&self.beta).map(|(x, b)| x * b).sum::<f64>() * self.y_scale
    }

    /// Changepoint locations on the scaled time axis
    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }
}

impl ForecastModel for ProphetModel {
    type Trained = TrainedProphetModel;

    fn train(&self, frame: &ModelingFrame) -> Result<TrainedProphetModel> {
        let y = &frame.audience_count;
        if let Some(bad) = y.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric(format!(
                "Non-finite audience count {} at position {}",
                y[bad], bad
            )));
        }
        if y.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: y.len(),
            });
        }

        let (start, last) = match (frame.index.iter().min(), frame.index.iter().max()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ForecastError::EmptyData("modeling frame has no index".to_string())),
        };
        let span_days = days_between(start, last);
        if span_days <= 0.0 {
            return Err(ForecastError::Numeric(
                "History covers zero time; cannot scale the trend".to_string(),
            ));
        }

        let abs_max = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let y_scale = if abs_max > 0.0 { abs_max } else { 1.0 };
        let scaled: Vec<f64> = y.iter().map(|v| v / y_scale).collect();

        let changepoints: Vec<f64> = self
            .changepoint_rows(y.len())
            .into_iter()
            .map(|row| days_between(start, frame.index[row]) / span_days)
            .collect();

        let design: Vec<Vec<f64>> = frame
            .index
            .iter()
            .map(|ts| {
                TrainedProphetModel::design_row(
                    start,
                    span_days,
                    &changepoints,
                    &self.seasonalities,
                    *ts,
                )
            })
            .collect();

        let beta = ridge_least_squares(&design, &scaled, &self.penalties(changepoints.len()))?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::Numeric(
                "Prophet fit produced non-finite coefficients".to_string(),
            ));
        }

        let fitted: Vec<f64> = design
            .iter()
            .map(|row| row.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>() * y_scale)
            .collect();
        let residual_variance = y
            .iter()
            .zip(&fitted)
            .map(|(a, f)| (a - f).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        log::info!(
            "Fitted {} on {} observations with {} changepoint(s)",
            self.name,
            y.len(),
            changepoints.len()
        );

        Ok(TrainedProphetModel {
            name: self.name.clone(),
            start,
            last,
            span_days,
            y_scale,
            changepoints,
            seasonalities: self.seasonalities.clone(),
            beta,
            fitted,
            residual_variance,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedProphetModel {
    /// Daily steps after the last observed timestamp
    fn forecast(&self, periods: usize) -> Result<ForecastResult> {
        if periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast periods must be at least 1".to_string(),
            ));
        }

        let values: Vec<f64> = (1..=periods as i64)
            .map(|day| self.predict_at(self.last + Duration::days(day)))
            .collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric(format!(
                "{} forecast is not finite",
                self.name
            )));
        }

        Ok(ForecastResult::new(values))
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    fn name(&self) -> &str {
        &self.name
    }
}
