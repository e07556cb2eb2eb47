//! Holt's linear trend method (double exponential smoothing).

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Copy)]
struct HoltState {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
}

/// Exponential smoothing with an additive trend component and no seasonality.
///
/// When the smoothing parameters are not fixed up front, `fit` selects them by
/// a deterministic coarse-to-fine grid search minimising the one-step-ahead
/// squared error over the training data.
#[derive(Debug, Clone, Default)]
pub struct Holt {
    fixed_alpha: Option<f64>,
    fixed_beta: Option<f64>,
    fitted: Option<HoltState>,
}

impl Holt {
    /// Holt model whose parameters are chosen automatically during `fit`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Holt model with fixed smoothing parameters, both in `(0, 1)`.
    pub fn with_params(alpha: f64, beta: f64) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{name} must lie in (0, 1), got {value}"
                )));
            }
        }
        Ok(Self {
            fixed_alpha: Some(alpha),
            fixed_beta: Some(beta),
            fitted: None,
        })
    }

    /// Smoothing parameters of the fitted model, `(alpha, beta)`.
    pub fn params(&self) -> Result<(f64, f64)> {
        let state = self.fitted.ok_or(ForecastError::FitRequired)?;
        Ok((state.alpha, state.beta))
    }

    /// Final level and trend components after fitting.
    pub fn components(&self) -> Result<(f64, f64)> {
        let state = self.fitted.ok_or(ForecastError::FitRequired)?;
        Ok((state.level, state.trend))
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "training values must be finite".into(),
            ));
        }

        let (alpha, beta) = match (self.fixed_alpha, self.fixed_beta) {
            (Some(alpha), Some(beta)) => (alpha, beta),
            _ => select_params(values),
        };

        let (level, trend, _) = smooth(values, alpha, beta);
        self.fitted = Some(HoltState {
            alpha,
            beta,
            level,
            trend,
        });
        Ok(())
    }

    /// Forecast `horizon` steps beyond the end of the training data by
    /// extrapolating the final level and trend.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let state = self.fitted.ok_or(ForecastError::FitRequired)?;
        Ok((1..=horizon)
            .map(|h| state.level + h as f64 * state.trend)
            .collect())
    }
}

/// Run the smoothing recursions, returning the final level, the final trend
/// and the accumulated one-step-ahead squared error.
fn smooth(values: &[f64], alpha: f64, beta: f64) -> (f64, f64, f64) {
    let mut level = values[0];
    let mut trend = values[1] - values[0];
    let mut sse = 0.0;

    for &y in &values[1..] {
        let forecast = level + trend;
        let err = y - forecast;
        sse += err * err;

        let prev_level = level;
        level = alpha * y + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }

    (level, trend, sse)
}

/// Coarse grid over `(alpha, beta)` followed by one refinement pass around
/// the coarse winner. Ties keep the earlier candidate, so the result is
/// independent of floating-point noise in iteration order.
fn select_params(values: &[f64]) -> (f64, f64) {
    let coarse: Vec<f64> = (1..20).map(|i| i as f64 * 0.05).collect();
    let (mut best_alpha, mut best_beta, mut best_sse) = (0.5, 0.1, f64::INFINITY);

    for &alpha in &coarse {
        for &beta in &coarse {
            let (_, _, sse) = smooth(values, alpha, beta);
            if sse < best_sse {
                best_sse = sse;
                best_alpha = alpha;
                best_beta = beta;
            }
        }
    }

    let refine = |center: f64| -> Vec<f64> {
        (-4i32..=4)
            .map(|i| center + i as f64 * 0.01)
            .filter(|v| *v > 0.0 && *v < 1.0)
            .collect()
    };

    for alpha in refine(best_alpha) {
        for beta in refine(best_beta) {
            let (_, _, sse) = smooth(values, alpha, beta);
            if sse < best_sse {
                best_sse = sse;
                best_alpha = alpha;
                best_beta = beta;
            }
        }
    }

    (best_alpha, best_beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_series_extrapolates_exactly() {
        let values: Vec<f64> = (0..20).map(|i| 3.0 + 2.0 * i as f64).collect();
        let mut model = Holt::new();
        model.fit(&values).unwrap();

        let forecast = model.forecast(5).unwrap();
        for (h, value) in forecast.iter().enumerate() {
            let expected = 3.0 + 2.0 * (19 + h + 1) as f64;
            assert_relative_eq!(*value, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn flat_series_forecasts_flat() {
        let values = vec![4.0; 15];
        let mut model = Holt::new();
        model.fit(&values).unwrap();

        for value in model.forecast(7).unwrap() {
            assert_relative_eq!(value, 4.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn forecast_before_fit_is_rejected() {
        let model = Holt::new();
        assert!(matches!(
            model.forecast(3),
            Err(ForecastError::FitRequired)
        ));
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = Holt::new();
        assert!(matches!(
            model.fit(&[1.0]),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut model = Holt::new();
        assert!(matches!(
            model.fit(&[1.0, f64::NAN, 3.0]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn invalid_fixed_params_are_rejected() {
        assert!(Holt::with_params(0.0, 0.5).is_err());
        assert!(Holt::with_params(0.5, 1.0).is_err());
        assert!(Holt::with_params(0.3, 0.2).is_ok());
    }

    #[test]
    fn fixed_params_are_kept_verbatim() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let mut model = Holt::with_params(0.4, 0.3).unwrap();
        model.fit(&values).unwrap();
        assert_eq!(model.params().unwrap(), (0.4, 0.3));
    }

    #[test]
    fn fitting_twice_is_deterministic() {
        let values: Vec<f64> = (0..30)
            .map(|i| 10.0 + 0.5 * i as f64 + ((i * 7) % 5) as f64)
            .collect();

        let mut a = Holt::new();
        let mut b = Holt::new();
        a.fit(&values).unwrap();
        b.fit(&values).unwrap();

        assert_eq!(a.params().unwrap(), b.params().unwrap());
        assert_eq!(a.forecast(7).unwrap(), b.forecast(7).unwrap());
    }
}
