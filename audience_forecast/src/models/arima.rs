//! ARIMA and seasonal ARIMA models for audience forecasting
//!
//! Coefficients are estimated by minimising the conditional sum of squares
//! (CSS) of the differenced series with a bounded Nelder-Mead search. A
//! seasonal model multiplies its regular and seasonal lag polynomials, so
//! SARIMA(1,1,1)(1,1,1,24) ends up with AR weights at lags 1, 24 and 25.
//! Differenced models carry no intercept.

use crate::error::{ForecastError, Result};
use crate::features::ModelingFrame;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use audience_math::differencing::{DifferencedSeries, Differencer};
use audience_math::optimize::{nelder_mead, NelderMeadConfig};

/// Stationarity/invertibility box for every lag coefficient
const COEFFICIENT_BOUND: f64 = 0.99;

/// Seasonal part of a SARIMA order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Season length in observations (s)
    pub period: usize,
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
    /// Seasonal order, if any
    seasonal: Option<SeasonalOrder>,
    /// Optimizer settings for CSS estimation
    optimizer: NelderMeadConfig,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    /// Fitted coefficients
    coefficients: Coefficients,
    /// Expanded lag polynomials
    polynomials: LagPolynomials,
    /// Historical data with every differencing level
    history: DifferencedSeries,
    /// CSS residuals of the stationary series
    residuals: Vec<f64>,
    /// One-step fitted values on the original scale
    fitted: Vec<f64>,
    /// Mean squared residual
    residual_variance: f64,
}

/// Estimated coefficients grouped by role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coefficients {
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

/// Weights per lag after multiplying regular and seasonal factors.
/// Index `k` holds the weight on lag `k`; index 0 is unused.
#[derive(Debug, Clone, PartialEq)]
struct LagPolynomials {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl ArimaModel {
    /// Create a new non-seasonal ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
            seasonal: None,
            optimizer: default_optimizer(),
        }
    }

    /// Create a seasonal ARIMA model
    pub fn seasonal(p: usize, d: usize, q: usize, seasonal: SeasonalOrder) -> Result<Self> {
        if seasonal.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal.period
            )));
        }

        Ok(Self {
            name: format!(
                "SARIMA({},{},{})({},{},{},{})",
                p, d, q, seasonal.p, seasonal.d, seasonal.q, seasonal.period
            ),
            p,
            d,
            q,
            seasonal: Some(seasonal),
            optimizer: default_optimizer(),
        })
    }

    /// ARIMA(2,1,2), the pipeline's non-seasonal backend
    pub fn audience_default() -> Self {
        Self::new(2, 1, 2)
    }

    /// SARIMA(1,1,1)(1,1,1,24), the pipeline's seasonal backend
    pub fn audience_seasonal() -> Result<Self> {
        Self::seasonal(
            1,
            1,
            1,
            SeasonalOrder {
                p: 1,
                d: 1,
                q: 1,
                period: 24,
            },
        )
    }

    /// Replace the optimizer settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Fewest observations `train` accepts
    pub fn min_observations(&self) -> usize {
        self.differencer().total_lag() + self.max_lag() + 2
    }

    fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal.unwrap_or(SeasonalOrder {
            p: 0,
            d: 0,
            q: 0,
            period: 1,
        })
    }

    fn differencer(&self) -> Differencer {
        let s = self.seasonal_order();
        Differencer::new(self.d, s.d, s.period)
    }

    fn max_lag(&self) -> usize {
        let s = self.seasonal_order();
        (self.p + s.p * s.period).max(self.q + s.q * s.period)
    }

    fn include_mean(&self) -> bool {
        self.differencer().total_lag() == 0
    }

    fn initial_params(&self, mean: f64) -> Vec<f64> {
        let s = self.seasonal_order();
        let mut params = Vec::new();
        if self.include_mean() {
            params.push(mean);
        }
        for order in [self.p, self.q, s.p, s.q] {
            params.extend((0..order).map(|i| 0.1 / (i + 1) as f64));
        }
        params
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let s = self.seasonal_order();
        let mut bounds = Vec::new();
        if self.include_mean() {
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        let lags = self.p + self.q + s.p + s.q;
        bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(lags));
        bounds
    }

    fn unpack(&self, params: &[f64]) -> Coefficients {
        let s = self.seasonal_order();
        let mut cursor = 0;
        let mut take = |n: usize| {
            let end = (cursor + n).min(params.len());
            let group = params[cursor.min(end)..end].to_vec();
            cursor = end;
            group
        };

        let intercept = if self.include_mean() {
            take(1).first().copied().unwrap_or(0.0)
        } else {
            0.0
        };
        Coefficients {
            intercept,
            ar: take(self.p),
            ma: take(self.q),
            seasonal_ar: take(s.p),
            seasonal_ma: take(s.q),
        }
    }
}

fn default_optimizer() -> NelderMeadConfig {
    NelderMeadConfig {
        max_iter: 2000,
        tolerance: 1e-10,
        initial_step: 0.5,
        ..NelderMeadConfig::default()
    }
}

impl LagPolynomials {
    fn expand(c: &Coefficients, period: usize) -> Self {
        // (1 - sum phi B^i)(1 - sum Phi B^(i s)) and (1 + sum theta B^i)(1 + sum Theta B^(i s))
        let ar = multiply(&factor(&c.ar, 1, -1.0), &factor(&c.seasonal_ar, period, -1.0));
        let ma = multiply(&factor(&c.ma, 1, 1.0), &factor(&c.seasonal_ma, period, 1.0));

        Self {
            ar: ar
                .iter()
                .enumerate()
                .map(|(k, v)| if k == 0 { 0.0 } else { -v })
                .collect(),
            ma: ma
                .iter()
                .enumerate()
                .map(|(k, v)| if k == 0 { 0.0 } else { *v })
                .collect(),
        }
    }

    /// First index with a complete lag history
    fn start(&self) -> usize {
        (self.ar.len() - 1).max(self.ma.len() - 1)
    }

    /// Conditional one-step prediction of `w[t]`; needs `t >= start()`
    fn predict(&self, w: &[f64], e: &[f64], t: usize, mean: f64) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, a)| **a != 0.0)
            .map(|(k, a)| a * (w[t - k] - mean))
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, m)| **m != 0.0)
            .map(|(k, m)| m * e[t - k])
            .sum();
        mean + ar + ma
    }

    /// CSS residuals; positions before `start()` are zero
    fn residuals(&self, w: &[f64], mean: f64) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in self.start()..w.len() {
            e[t] = w[t] - self.predict(w, &e, t, mean);
        }
        e
    }
}

/// Lag polynomial `1 + sign * sum c_i B^(i * spacing)` as dense weights
fn factor(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, frame: &ModelingFrame) -> Result<TrainedArimaModel> {
        let series = &frame.audience_count;
        if let Some(bad) = series.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric(format!(
                "Non-finite audience count {} at position {}",
                series[bad], bad
            )));
        }

        let needed = self.min_observations();
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: series.len(),
            });
        }

        let history = self.differencer().apply(series)?;
        let w = history.stationary();
        let period = self.seasonal_order().period;

        // CSS is minimised on a unit-variance copy so the tolerance is scale-free
        let sd = standard_deviation(w);
        let scale = if sd.is_finite() && sd > 0.0 { sd } else { 1.0 };
        let scaled: Vec<f64> = w.iter().map(|v| v / scale).collect();
        let scaled_mean = scaled.iter().sum::<f64>() / scaled.len() as f64;

        let initial = self.initial_params(scaled_mean);
        let bounds = self.bounds();
        let css = |params: &[f64]| {
            let c = self.unpack(params);
            let poly = LagPolynomials::expand(&c, period);
            poly.residuals(&scaled, c.intercept)[poly.start()..]
                .iter()
                .map(|e| e * e)
                .sum::<f64>()
        };

        let params = if initial.is_empty() {
            Vec::new()
        } else {
            let minimum = nelder_mead(css, &initial, Some(&bounds), &self.optimizer);
            if !minimum.value.is_finite() || minimum.point.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::Numeric(format!(
                    "{} estimation produced non-finite parameters",
                    self.name
                )));
            }
            if !minimum.converged {
                log::debug!(
                    "{} CSS search stopped after {} iterations without converging",
                    self.name,
                    minimum.iterations
                );
            }
            minimum.point
        };

        let mut coefficients = self.unpack(&params);
        coefficients.intercept *= scale;
        let polynomials = LagPolynomials::expand(&coefficients, period);

        let start = polynomials.start();
        let residuals = polynomials.residuals(w, coefficients.intercept);
        let tail = &residuals[start..];
        let residual_variance = tail.iter().map(|e| e * e).sum::<f64>() / tail.len() as f64;
        if !residual_variance.is_finite() {
            return Err(ForecastError::Numeric(format!(
                "{} produced non-finite residuals",
                self.name
            )));
        }

        let offset = history.offset();
        let fitted = series
            .iter()
            .enumerate()
            .map(|(t, y)| {
                if t >= offset + start {
                    y - residuals[t - offset]
                } else if t == 0 {
                    *y
                } else {
                    series[t - 1]
                }
            })
            .collect();

        log::info!(
            "Fitted {} on {} observations (residual variance {:.4})",
            self.name,
            series.len(),
            residual_variance
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            coefficients,
            polynomials,
            history,
            residuals,
            fitted,
            residual_variance,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Get the fitted coefficients
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Get the CSS residuals of the differenced series
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, periods: usize) -> Result<ForecastResult> {
        if periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast periods must be at least 1".to_string(),
            ));
        }

        let mean = self.coefficients.intercept;
        let mut w = self.history.stationary().to_vec();
        let mut e = self.residuals.clone();
        let n = w.len();

        // Future shocks are zero
        for t in n..n + periods {
            let next = self.polynomials.predict(&w, &e, t, mean);
            w.push(next);
            e.push(0.0);
        }

        let values = self.history.integrate(&w[n..])?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric(format!(
                "{} forecast is not finite",
                self.name
            )));
        }

        Ok(ForecastResult::new(values))
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasonal_polynomials_are_multiplicative() {
        let c = Coefficients {
            intercept: 0.0,
            ar: vec![0.5],
            ma: vec![0.3],
            seasonal_ar: vec![0.4],
            seasonal_ma: vec![0.2],
        };
        let poly = LagPolynomials::expand(&c, 24);

        assert_eq!(poly.ar.len(), 26);
        assert!((poly.ar[1] - 0.5).abs() < 1e-12);
        assert!((poly.ar[24] - 0.4).abs() < 1e-12);
        assert!((poly.ar[25] + 0.2).abs() < 1e-12);
        assert!((poly.ma[1] - 0.3).abs() < 1e-12);
        assert!((poly.ma[24] - 0.2).abs() < 1e-12);
        assert!((poly.ma[25] - 0.06).abs() < 1e-12);
        assert_eq!(poly.start(), 25);
    }

    #[test]
    fn test_min_observations() {
        assert_eq!(ArimaModel::audience_default().min_observations(), 5);
        assert_eq!(ArimaModel::audience_seasonal().unwrap().min_observations(), 52);
    }

    #[test]
    fn test_unpack_without_intercept_when_differenced() {
        let model = ArimaModel::audience_default();
        let c = model.unpack(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(c.intercept, 0.0);
        assert_eq!(c.ar, vec![0.1, 0.2]);
        assert_eq!(c.ma, vec![0.3, 0.4]);
    }
}
