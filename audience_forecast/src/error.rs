//! Error types for the audience_forecast crate

use audience_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the audience_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Required input columns are absent
    #[error("Schema error: missing required column(s) {missing:?}")]
    Schema { missing: Vec<String> },

    /// A model type outside ARIMA, SARIMA and Prophet was requested
    #[error("Unsupported model type: {0}")]
    UnsupportedModel(String),

    /// Forecast requested before any model was trained
    #[error("No model has been trained; call train before forecast")]
    NotTrained,

    /// Division by zero, singular systems, non-finite fits
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// A single cell could not be interpreted
    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Too few observations for the requested model
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Paired sequences differ in length
    #[error("Dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Nothing to work with
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading config or writing reports
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ForecastError {
    /// Short, stable name of the error kind for user-facing reports
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::Schema { .. } => "SchemaError",
            ForecastError::UnsupportedModel(_) => "UnsupportedModelError",
            ForecastError::NotTrained => "NotTrainedError",
            ForecastError::Numeric(_) => "NumericError",
            ForecastError::InvalidValue { .. } => "InvalidValueError",
            ForecastError::InsufficientData { .. } => "InsufficientDataError",
            ForecastError::DimensionMismatch { .. } => "DimensionMismatchError",
            ForecastError::EmptyData(_) => "EmptyDataError",
            ForecastError::InvalidParameter(_) => "InvalidParameterError",
            ForecastError::IoError(_) => "IoError",
            ForecastError::PolarsError(_) => "PolarsError",
            ForecastError::CsvError(_) => "CsvError",
            ForecastError::JsonError(_) => "JsonError",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
            MathError::InsufficientData(msg) | MathError::CalculationError(msg) => {
                ForecastError::Numeric(msg)
            }
        }
    }
}
