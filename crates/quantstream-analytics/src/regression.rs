//! Ordinary least squares regression between two price series.

use serde::{Deserialize, Serialize};

use crate::math::{finite_or_zero, mean, population_std, student_t_p_value};
use crate::{AnalyticsError, Result};

/// OLS fit of `y = alpha + beta * x` over aligned windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Regressor symbol.
    pub symbol_x: String,
    /// Dependent symbol.
    pub symbol_y: String,
    /// Slope, used as the hedge ratio.
    pub beta: f64,
    /// Intercept.
    pub alpha: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Correlation coefficient.
    pub r_value: f64,
    /// Two-sided p-value for a zero slope.
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// Mean of the residuals.
    pub residual_mean: f64,
    /// Population standard deviation of the residuals.
    pub residual_std: f64,
    /// Number of aligned samples used.
    pub sample_size: usize,
}

/// Regression calculator over aligned price slices.
#[derive(Debug, Clone, Copy)]
pub struct RegressionCalculator {
    min_periods: usize,
}

impl RegressionCalculator {
    /// Creates a calculator requiring at least `min_periods` aligned samples
    /// (never fewer than three).
    #[must_use]
    pub fn new(min_periods: usize) -> Self {
        Self {
            min_periods: min_periods.max(3),
        }
    }

    /// Regresses `prices_y` on `prices_x` over their aligned suffix.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `min_periods` samples are available
    /// or when `prices_x` is constant.
    pub fn calculate(
        &self,
        symbol_x: &str,
        prices_x: &[f64],
        symbol_y: &str,
        prices_y: &[f64],
    ) -> Result<RegressionResult> {
        let n = prices_x.len().min(prices_y.len());
        if n < self.min_periods {
            return Err(AnalyticsError::InsufficientData {
                available: n,
                required: self.min_periods,
            });
        }
        let x = &prices_x[prices_x.len() - n..];
        let y = &prices_y[prices_y.len() - n..];

        let mx = mean(x);
        let my = mean(y);
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (a, b) in x.iter().zip(y) {
            sxx += (a - mx) * (a - mx);
            syy += (b - my) * (b - my);
            sxy += (a - mx) * (b - my);
        }

        if sxx <= 0.0 || !sxx.is_finite() {
            return Err(AnalyticsError::ConstantSeries(symbol_x.to_string()));
        }

        let beta = sxy / sxx;
        let alpha = my - beta * mx;
        if !beta.is_finite() || !alpha.is_finite() {
            return Err(AnalyticsError::NonFinite("regression coefficients"));
        }

        let r_value = if syy > 0.0 {
            (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let df = (n - 2) as f64;
        let unexplained = (1.0 - r_value) * (1.0 + r_value);
        let p_value = if unexplained <= 0.0 {
            0.0
        } else {
            student_t_p_value(r_value * (df / unexplained).sqrt(), df)?
        };
        let std_err = (unexplained.max(0.0) * syy / sxx / df).sqrt();

        let residuals: Vec<f64> = x
            .iter()
            .zip(y)
            .map(|(a, b)| b - (alpha + beta * a))
            .collect();
        let residual_mean = mean(&residuals);

        Ok(RegressionResult {
            symbol_x: symbol_x.to_string(),
            symbol_y: symbol_y.to_string(),
            beta,
            alpha,
            r_squared: r_value * r_value,
            r_value,
            p_value,
            std_err: finite_or_zero(std_err),
            residual_mean: finite_or_zero(residual_mean),
            residual_std: finite_or_zero(population_std(&residuals, residual_mean)),
            sample_size: n,
        })
    }
}
