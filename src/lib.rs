//! # Audience Insight
//!
//! Facade over the workspace crates:
//!
//! - [`math`]: rolling windows, differencing, optimisation and linear solvers
//! - [`forecast`]: loading, feature engineering, forecasting and reporting
//!
//! ## Example
//!
//! ```
//! use audience_insight::forecast::ModelType;
//!
//! let model: ModelType = "sarima".parse().unwrap();
//! assert_eq!(model, ModelType::Sarima);
//! ```

pub use audience_forecast as forecast;
pub use audience_math as math;

pub use audience_forecast::{
    DashboardConfig, DashboardSession, ForecastEngine, ForecastError, ForecastRequest, ModelType,
};
