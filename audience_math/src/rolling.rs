//! Trailing-window statistics
//!
//! Windows accept partial fills: a window that has seen fewer values than its
//! period still reports statistics over whatever it holds, so the first rows
//! of a series get partial-window values instead of gaps.

use crate::{MathError, Result};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Mean and standard deviation of one trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Trailing window over the last `period` values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    /// Create a new window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Push a new value, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);

        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Mean of the values currently held
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(MathError::InsufficientData(
                "Rolling window is empty".to_string(),
            ));
        }

        Ok(self.values.iter().mean())
    }

    /// Sample standard deviation (ddof = 1) of the values currently held.
    ///
    /// A single-sample window has no spread and reports 0.
    pub fn std_dev(&self) -> Result<f64> {
        match self.values.len() {
            0 => Err(MathError::InsufficientData(
                "Rolling window is empty".to_string(),
            )),
            1 => Ok(0.0),
            _ => Ok(self.values.iter().std_dev()),
        }
    }

    /// Both statistics at once
    pub fn stats(&self) -> Result<RollingStats> {
        Ok(RollingStats {
            mean: self.mean()?,
            std_dev: self.std_dev()?,
        })
    }

    /// Get the window period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reset the window, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Trailing statistics for every position of `values`, window of up to `period`
pub fn rolling_stats(values: &[f64], period: usize) -> Result<Vec<RollingStats>> {
    let mut window = RollingWindow::new(period)?;
    let mut out = Vec::with_capacity(values.len());

    for &value in values {
        window.update(value);
        out.push(window.stats()?);
    }

    Ok(out)
}
