//! Forecasting models for audience time series
//!
//! Each backend implements [`ForecastModel`] (untrained settings)
//! producing a [`TrainedForecastModel`]. [`ModelType`] names the backends the
//! pipeline exposes and erases their concrete types behind a boxed trait
//! object so the engine can hold any of them.

use crate::error::{ForecastError, Result};
use crate::features::ModelingFrame;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::{self, Debug};
use std::str::FromStr;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Forecasted values
    pub(crate) values: Vec<f64>,
    /// Confidence intervals (optional)
    pub(crate) intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            intervals: None,
        }
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(values: Vec<f64>, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: intervals.len(),
            });
        }

        Ok(Self {
            values,
            intervals: Some(intervals),
        })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Consume the result, keeping only the point forecasts
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Two-sided normal quantile for a confidence `level` in (0, 1)
pub(crate) fn normal_quantile(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Confidence level must be between 0 and 1, got {}",
            level
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::Numeric(e.to_string()))?;
    Ok(normal.inverse_cdf((1.0 + level) / 2.0))
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Point forecasts for the next `periods` steps
    fn forecast(&self, periods: usize) -> Result<ForecastResult>;

    /// One-step-ahead fitted values aligned with the training index
    fn fitted_values(&self) -> &[f64];

    /// Variance of the in-sample one-step residuals
    fn residual_variance(&self) -> f64;

    /// Name of the model
    fn name(&self) -> &str;

    /// Point forecasts with symmetric normal intervals.
    ///
    /// The interval half-width at step `h` is `z * sqrt(variance * h)`.
    fn forecast_with_intervals(&self, periods: usize, level: f64) -> Result<ForecastResult> {
        let z = normal_quantile(level)?;
        let variance = self.residual_variance().max(0.0);
        let values = self.forecast(periods)?.into_values();
        let intervals = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let margin = z * (variance * (i + 1) as f64).sqrt();
                (v - margin, v + margin)
            })
            .collect();

        ForecastResult::new_with_intervals(values, intervals)
    }
}

/// Forecast model that can be trained on a modeling frame
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel + 'static;

    /// Train the model on the frame's audience series
    fn train(&self, frame: &ModelingFrame) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Backends selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Non-seasonal ARIMA(2,1,2)
    Arima,
    /// Seasonal ARIMA(1,1,1)(1,1,1,24)
    Sarima,
    /// Additive trend plus Fourier seasonality
    Prophet,
}

impl ModelType {
    /// Every supported backend
    pub const ALL: [ModelType; 3] = [ModelType::Arima, ModelType::Sarima, ModelType::Prophet];

    /// Train this backend with its default configuration
    pub fn train(&self, frame: &ModelingFrame) -> Result<Box<dyn TrainedForecastModel>> {
        let trained: Box<dyn TrainedForecastModel> = match self {
            ModelType::Arima => Box::new(arima::ArimaModel::audience_default().train(frame)?),
            ModelType::Sarima => Box::new(arima::ArimaModel::audience_seasonal()?.train(frame)?),
            ModelType::Prophet => Box::new(prophet::ProphetModel::default().train(frame)?),
        };
        Ok(trained)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModelType::Arima => "ARIMA",
            ModelType::Sarima => "SARIMA",
            ModelType::Prophet => "Prophet",
        };
        f.write_str(label)
    }
}

impl FromStr for ModelType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ARIMA" => Ok(ModelType::Arima),
            "SARIMA" => Ok(ModelType::Sarima),
            "PROPHET" => Ok(ModelType::Prophet),
            _ => Err(ForecastError::UnsupportedModel(s.to_string())),
        }
    }
}

pub mod arima;
pub mod prophet;
