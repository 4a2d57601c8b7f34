//! # Audience Forecast
//!
//! A Rust library for audience analytics and forecasting.
//!
//! ## Features
//!
//! - CSV loading with schema validation (polars)
//! - Timestamp parsing, KNN imputation and calendar features
//! - Per-platform rolling statistics and engagement scores
//! - Forecasting models (ARIMA, seasonal ARIMA, Prophet-style additive model)
//! - In-sample accuracy metrics and chart-ready insight aggregates
//! - Content-hash memoization owned by the caller's session
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audience_forecast::{DashboardConfig, DashboardSession, ForecastRequest, ModelType};
//!
//! # fn main() -> audience_forecast::Result<()> {
//! let mut session = DashboardSession::new(DashboardConfig::default());
//! session.load_csv("audience.csv")?;
//!
//! let request = ForecastRequest::new(ModelType::Arima, 30).with_platform("Web");
//! let outcome = session.run_forecast(&request)?;
//! println!("{} -> {:?}", outcome.model_name, outcome.values());
//! if let Some(metrics) = &outcome.metrics {
//!     println!("{}", metrics);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod features;
pub mod impute;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod output;
pub mod session;

// Re-export commonly used types
pub use crate::cache::PipelineCache;
pub use crate::config::DashboardConfig;
pub use crate::data::{CleanTable, DataLoader, Preprocessor, RawAudienceTable};
pub use crate::engine::ForecastEngine;
pub use crate::error::{ForecastError, Result};
pub use crate::features::{prepare_for_modeling, FeatureEngineer, FeaturedTable, FilterSpec, ModelingFrame};
pub use crate::metrics::{compute_metrics, MetricScope, MetricsBundle};
pub use crate::models::{ForecastModel, ForecastResult, ModelType, TrainedForecastModel};
pub use crate::output::write_forecast_csv;
pub use crate::session::{DashboardSession, ForecastOutcome, ForecastRequest};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
