//! Differencing and its inverse
//!
//! A [`Differencer`] applies a sequence of lagged differences (lag 1 for the
//! regular order, lag `s` for seasonal orders) and keeps every intermediate
//! level so forecasts made on the stationary scale can be integrated back.

use crate::{MathError, Result};

/// Lagged difference: `out[t] = series[t + lag] - series[t]`
pub fn difference(series: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 || series.len() <= lag {
        return Vec::new();
    }

    series
        .iter()
        .skip(lag)
        .zip(series.iter())
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Undo one lagged difference for values that follow `history`
pub fn integrate(differenced: &[f64], history: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 || history.len() < lag {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} historical values to integrate lag {}, have {}",
            lag,
            lag,
            history.len()
        )));
    }

    let mut extended = history.to_vec();
    for &value in differenced {
        let base = extended[extended.len() - lag];
        extended.push(base + value);
    }

    Ok(extended.split_off(history.len()))
}

/// Ordered sequence of lagged differences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Differencer {
    lags: Vec<usize>,
}

impl Differencer {
    /// `d` regular differences followed by `seasonal_d` differences at `period`
    pub fn new(d: usize, seasonal_d: usize, period: usize) -> Self {
        let mut lags = vec![1; d];
        if period > 1 {
            lags.extend(std::iter::repeat(period).take(seasonal_d));
        }
        Self { lags }
    }

    /// Observations consumed by differencing
    pub fn total_lag(&self) -> usize {
        self.lags.iter().sum()
    }

    /// Lags in application order
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// Difference `series`, keeping every intermediate level
    pub fn apply(&self, series: &[f64]) -> Result<DifferencedSeries> {
        if series.len() <= self.total_lag() {
            return Err(MathError::InsufficientData(format!(
                "Differencing with lags {:?} needs more than {} values, have {}",
                self.lags,
                self.total_lag(),
                series.len()
            )));
        }

        let mut levels = Vec::with_capacity(self.lags.len() + 1);
        levels.push(series.to_vec());
        for &lag in &self.lags {
            let next = difference(levels.last().map(Vec::as_slice).unwrap_or(&[]), lag);
            levels.push(next);
        }

        Ok(DifferencedSeries {
            lags: self.lags.clone(),
            levels,
        })
    }
}

/// A series with every differencing level retained
#[derive(Debug, Clone)]
pub struct DifferencedSeries {
    lags: Vec<usize>,
    levels: Vec<Vec<f64>>,
}

impl DifferencedSeries {
    /// The original, undifferenced values
    pub fn original(&self) -> &[f64] {
        &self.levels[0]
    }

    /// The fully differenced values
    pub fn stationary(&self) -> &[f64] {
        self.levels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Offset of `stationary()[0]` within `original()`
    pub fn offset(&self) -> usize {
        self.lags.iter().sum()
    }

    /// Map forecasts of the stationary series back to the original scale
    pub fn integrate(&self, forecasts: &[f64]) -> Result<Vec<f64>> {
        let mut current = forecasts.to_vec();
        for (level, &lag) in self.levels.iter().zip(self.lags.iter()).rev() {
            current = integrate(&current, level, lag)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_lag_one() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn test_integrate_recovers_continuation() {
        let history = [1.0, 3.0, 6.0];
        let restored = integrate(&[4.0, 5.0], &history, 1).unwrap();
        assert_eq!(restored, vec![10.0, 15.0]);
    }

    #[test]
    fn test_seasonal_round_trip() {
        let series: Vec<f64> = (0..40).map(|i| (i % 4) as f64 * 10.0 + i as f64).collect();
        let differencer = Differencer::new(1, 1, 4);
        assert_eq!(differencer.total_lag(), 5);

        let head = differencer.apply(&series[..30]).unwrap();
        assert_eq!(head.stationary().len(), 25);

        // The tail's stationary values integrate back onto the tail itself
        let full = differencer.apply(&series).unwrap();
        let tail_stationary = &full.stationary()[25..];
        let restored = head.integrate(tail_stationary).unwrap();
        for (r, e) in restored.iter().zip(&series[30..]) {
            assert!((r - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_series_rejected() {
        let differencer = Differencer::new(1, 1, 24);
        assert!(differencer.apply(&[1.0; 25]).is_err());
    }
}
