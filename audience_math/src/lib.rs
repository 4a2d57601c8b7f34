//! # Audience Math
//!
//! Numeric building blocks shared by the audience forecasting pipeline.
//! This crate provides rolling-window statistics, differencing, a bounded
//! Nelder-Mead optimizer, a small dense solver and the distance used by the
//! nearest-neighbour imputer.

use thiserror::Error;

pub mod differencing;
pub mod distance;
pub mod linalg;
pub mod optimize;
pub mod rolling;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
