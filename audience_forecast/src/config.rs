//! Pipeline configuration
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the standard pipeline: 5-neighbour imputation, 7-row rolling
//! windows, prime time 19:00-22:59 and a 7..=90 day horizon defaulting to 30.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_KNN_NEIGHBORS: usize = 5;
pub const DEFAULT_ROLLING_WINDOW: usize = 7;
pub const DEFAULT_PRIME_TIME_START: u32 = 19;
pub const DEFAULT_PRIME_TIME_END: u32 = 22;
pub const MIN_HORIZON: usize = 7;
pub const MAX_HORIZON: usize = 90;
pub const DEFAULT_HORIZON: usize = 30;

/// Tunable knobs of the preprocessing and forecasting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Neighbours used by the KNN imputer
    pub knn_neighbors: usize,
    /// Trailing window (rows) for the rolling audience statistics
    pub rolling_window: usize,
    /// First prime-time hour, inclusive
    pub prime_time_start: u32,
    /// Last prime-time hour, inclusive
    pub prime_time_end: u32,
    /// Allowed forecast horizons in days
    pub horizon: HorizonBounds,
}

/// Bounds and default for the forecast horizon control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonBounds {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            knn_neighbors: DEFAULT_KNN_NEIGHBORS,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            prime_time_start: DEFAULT_PRIME_TIME_START,
            prime_time_end: DEFAULT_PRIME_TIME_END,
            horizon: HorizonBounds::default(),
        }
    }
}

impl Default for HorizonBounds {
    fn default() -> Self {
        Self {
            min: MIN_HORIZON,
            max: MAX_HORIZON,
            default: DEFAULT_HORIZON,
        }
    }
}

impl HorizonBounds {
    /// Check a requested horizon against the bounds
    pub fn check(&self, horizon: usize) -> Result<usize> {
        if horizon < self.min || horizon > self.max {
            return Err(ForecastError::InvalidParameter(format!(
                "Forecast horizon must be between {} and {} days, got {}",
                self.min, self.max, horizon
            )));
        }
        Ok(horizon)
    }
}

impl DashboardConfig {
    /// Load and validate a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.knn_neighbors == 0 {
            return Err(ForecastError::InvalidParameter(
                "knn_neighbors must be at least 1".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(ForecastError::InvalidParameter(
                "rolling_window must be at least 1".to_string(),
            ));
        }
        if self.prime_time_start > self.prime_time_end || self.prime_time_end > 23 {
            return Err(ForecastError::InvalidParameter(format!(
                "Prime time {}..={} is not a valid hour range",
                self.prime_time_start, self.prime_time_end
            )));
        }
        let h = &self.horizon;
        if h.min == 0 || h.min > h.max || h.default < h.min || h.default > h.max {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon bounds are inconsistent: min {}, max {}, default {}",
                h.min, h.max, h.default
            )));
        }
        Ok(())
    }

    /// Whether `hour` falls in the prime-time band
    pub fn is_prime_time(&self, hour: u32) -> bool {
        (self.prime_time_start..=self.prime_time_end).contains(&hour)
    }
}
