//! Single-user dashboard session
//!
//! A session loads one input at a time and answers forecast requests against
//! it. The featured table survives a failed forecast so callers can still
//! report the loaded summary.

use crate::cache::{content_hash, dataset_key, forecast_key, PipelineCache};
use crate::config::{DashboardConfig, HorizonBounds};
use crate::data::{DataLoader, Preprocessor};
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::features::{prepare_for_modeling, FeatureEngineer, FeaturedTable, FilterSpec, ModelingFrame};
use crate::insights::{self, InsightReport};
use crate::metrics::MetricsBundle;
use crate::models::{ForecastResult, ModelType};
use crate::output::future_daily_timestamps;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Confidence level of the reported prediction intervals
pub const INTERVAL_LEVEL: f64 = 0.95;

/// What to forecast and for how long
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub platform: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub model_type: ModelType,
    /// Days to forecast
    pub horizon: usize,
}

impl ForecastRequest {
    /// Request over all platforms and dates
    pub fn new(model_type: ModelType, horizon: usize) -> Self {
        Self {
            platform: None,
            start_date: None,
            end_date: None,
            model_type,
            horizon,
        }
    }

    /// Restrict to one platform
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Restrict to an inclusive date range
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// The row selection this request implies
    pub fn filter(&self) -> FilterSpec {
        FilterSpec {
            platform: self.platform.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Check the horizon and the date range
    pub fn validate(&self, bounds: &HorizonBounds) -> Result<()> {
        bounds.check(self.horizon)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ForecastError::InvalidParameter(format!(
                    "Start date {} is after end date {}",
                    start, end
                )));
            }
            if start == end {
                log::warn!("Date range covers the single day {}", start);
            }
        }
        Ok(())
    }
}

/// A completed forecast with its in-sample fit.
///
/// The forecast stands even when the fit cannot be scored; `metrics_error`
/// then carries the reason, e.g. a zero actual that leaves MAPE undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub model_type: ModelType,
    pub model_name: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub result: ForecastResult,
    pub metrics: Option<MetricsBundle>,
    pub metrics_error: Option<String>,
}

impl ForecastOutcome {
    /// Point forecasts
    pub fn values(&self) -> &[f64] {
        self.result.values()
    }
}

#[derive(Debug)]
struct LoadedData {
    dataset_key: String,
    featured: FeaturedTable,
}

/// Holds the loaded data, the forecast engine and the cache
#[derive(Debug, Default)]
pub struct DashboardSession {
    config: DashboardConfig,
    engine: ForecastEngine,
    cache: PipelineCache,
    data: Option<LoadedData>,
}

impl DashboardSession {
    /// Create a session with no data loaded
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The pipeline configuration
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The forecast engine
    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// The session's cache
    pub fn cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// Load a CSV file, replacing any previously loaded data
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<&FeaturedTable> {
        let bytes = fs::read(path)?;
        self.load_bytes(&bytes)
    }

    /// Load CSV bytes; identical content is served from the cache
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&FeaturedTable> {
        let key = dataset_key(&content_hash(bytes), &self.config);
        let config = &self.config;
        let featured = self
            .cache
            .dataset_or_try_insert(&key, || {
                let raw = DataLoader::from_bytes(bytes)?;
                let clean = Preprocessor::new(config)?.preprocess(&raw)?;
                FeatureEngineer::new(config).engineer_features(&clean)
            })?
            .clone();

        log::info!(
            "Loaded {} rows across {} platform(s)",
            featured.len(),
            featured.platforms().len()
        );
        let data = self.data.insert(LoadedData {
            dataset_key: key,
            featured,
        });
        Ok(&data.featured)
    }

    /// The loaded featured table
    pub fn featured(&self) -> Result<&FeaturedTable> {
        self.loaded().map(|data| &data.featured)
    }

    fn loaded(&self) -> Result<&LoadedData> {
        self.data
            .as_ref()
            .ok_or_else(|| ForecastError::EmptyData("No data has been loaded".to_string()))
    }

    /// Modeling frame for the request's platform and date range
    pub fn modeling_frame(&self, request: &ForecastRequest) -> Result<ModelingFrame> {
        let selected = self.featured()?.filter(&request.filter());
        Ok(prepare_for_modeling(&selected, request.platform.as_deref()))
    }

    /// Fit the requested model and forecast the horizon.
    ///
    /// Repeated identical requests are answered from the cache without
    /// retraining the engine.
    pub fn run_forecast(&mut self, request: &ForecastRequest) -> Result<ForecastOutcome> {
        request.validate(&self.config.horizon)?;
        let key = forecast_key(&self.loaded()?.dataset_key, request);
        if let Some(cached) = self.cache.forecast(&key) {
            log::debug!("Serving {} forecast from cache", cached.model_name);
            return Ok(cached.clone());
        }

        if request.platform.is_none() && self.featured()?.platforms().len() > 1 {
            log::warn!("No platform selected; modeling every platform as one series");
        }
        let frame = self.modeling_frame(request)?;
        let last = frame.last_timestamp().ok_or_else(|| {
            ForecastError::EmptyData(format!(
                "No rows match platform {:?} between {:?} and {:?}",
                request.platform, request.start_date, request.end_date
            ))
        })?;

        let model_name = self
            .engine
            .train_model(&frame, request.model_type)?
            .name()
            .to_string();
        let result = self
            .engine
            .forecast_with_intervals(request.horizon, INTERVAL_LEVEL)?;
        let (metrics, metrics_error) = match self.engine.in_sample_metrics(&frame) {
            Ok(metrics) => (Some(metrics), None),
            Err(err) => {
                log::warn!("In-sample metrics unavailable: {}", err);
                (None, Some(format!("{}: {}", err.kind(), err)))
            }
        };

        let outcome = ForecastOutcome {
            model_type: request.model_type,
            model_name,
            timestamps: future_daily_timestamps(last, request.horizon),
            result,
            metrics,
            metrics_error,
        };
        self.cache.insert_forecast(key, outcome.clone());
        Ok(outcome)
    }

    /// Insight report for the loaded data, with the forecast when one succeeded
    pub fn report(
        &self,
        request: &ForecastRequest,
        outcome: std::result::Result<&ForecastOutcome, &ForecastError>,
    ) -> Result<InsightReport> {
        let featured = self.featured()?;
        let selected = featured.filter(&request.filter());
        let frame = prepare_for_modeling(&selected, request.platform.as_deref());

        let (forecast, metrics, metrics_error, forecast_error) = match outcome {
            Ok(outcome) => (
                Some(insights::forecast_overlay(&frame, &outcome.model_name, &outcome.result)?),
                outcome.metrics,
                outcome.metrics_error.clone(),
                None,
            ),
            Err(err) => (None, None, None, Some(format!("{}: {}", err.kind(), err))),
        };

        Ok(InsightReport {
            overview: insights::overview(featured)?,
            engagement_trend: insights::engagement_trend(&selected),
            platform_comparison: insights::platform_comparison(featured),
            heatmap: insights::audience_heatmap(&selected),
            audience_trend: insights::audience_trend(&frame),
            forecast,
            metrics,
            metrics_error,
            forecast_error,
        })
    }
}
