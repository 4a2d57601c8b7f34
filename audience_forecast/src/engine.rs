//! Forecast engine holding the currently trained model

use crate::error::{ForecastError, Result};
use crate::features::ModelingFrame;
use crate::metrics::{compute_metrics, MetricScope, MetricsBundle};
use crate::models::{ForecastResult, ModelType, TrainedForecastModel};

/// Owns at most one trained model; every `train` replaces it.
#[derive(Debug, Default)]
pub struct ForecastEngine {
    model: Option<Box<dyn TrainedForecastModel>>,
    model_type: Option<ModelType>,
}

impl ForecastEngine {
    /// Create an untrained engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a model is ready to forecast
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Backend of the current model, if trained
    pub fn model_type(&self) -> Option<ModelType> {
        self.model_type
    }

    /// Train the backend named `model_type` (case-insensitive)
    pub fn train(&mut self, frame: &ModelingFrame, model_type: &str) -> Result<&dyn TrainedForecastModel> {
        let model_type: ModelType = model_type.parse()?;
        self.train_model(frame, model_type)
    }

    /// Train `model_type` on the frame's audience series.
    ///
    /// A failed fit leaves the engine untrained.
    pub fn train_model(
        &mut self,
        frame: &ModelingFrame,
        model_type: ModelType,
    ) -> Result<&dyn TrainedForecastModel> {
        self.model = None;
        self.model_type = None;

        if frame.is_empty() {
            return Err(ForecastError::EmptyData(
                "Modeling frame is empty; check the platform and date filters".to_string(),
            ));
        }
        if !frame.is_strictly_increasing() {
            log::warn!("Modeling frame index is not strictly increasing; fitting anyway");
        }

        let trained = model_type.train(frame)?;
        log::debug!("{} ready ({} fitted values)", trained.name(), trained.fitted_values().len());

        self.model_type = Some(model_type);
        Ok(&**self.model.insert(trained))
    }

    /// The current model
    pub fn model(&self) -> Result<&dyn TrainedForecastModel> {
        self.model.as_deref().ok_or(ForecastError::NotTrained)
    }

    /// Point forecasts for the next `periods` days
    pub fn forecast(&self, periods: usize) -> Result<Vec<f64>> {
        Ok(self.model()?.forecast(periods)?.into_values())
    }

    /// Point forecasts with normal prediction intervals at `level`
    pub fn forecast_with_intervals(&self, periods: usize, level: f64) -> Result<ForecastResult> {
        self.model()?.forecast_with_intervals(periods, level)
    }

    /// Metrics of the current model's fitted values against the frame it was trained on
    pub fn in_sample_metrics(&self, frame: &ModelingFrame) -> Result<MetricsBundle> {
        compute_metrics(
            &frame.audience_count,
            self.model()?.fitted_values(),
            MetricScope::InSample,
        )
    }
}
