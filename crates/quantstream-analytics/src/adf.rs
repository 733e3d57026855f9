//! Augmented Dickey-Fuller stationarity test.
//!
//! The test regresses the first difference of a series on its lagged level,
//! a constant and `p` lagged differences:
//!
//! ```text
//! dx[t] = gamma * x[t-1] + c + b1 * dx[t-1] + ... + bp * dx[t-p] + e[t]
//! ```
//!
//! The lag order `p` is chosen by minimum AIC over `0..=max_lag`, with every
//! candidate fitted on the same sample. The statistic is the t-value of
//! `gamma`; p-values and critical values come from MacKinnon's response
//! surface tables for the constant-only case.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::math::{OlsFit, normal_cdf};
use crate::{AnalyticsConfig, AnalyticsError, Result};

/// Statistic above which the p-value is one.
const TAU_MAX: f64 = 2.74;
/// Statistic below which the p-value is zero.
const TAU_MIN: f64 = -18.83;
/// Boundary between the small-p and large-p polynomials.
const TAU_STAR: f64 = -1.61;
/// Polynomial in the statistic for p-values left of [`TAU_STAR`].
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
/// Polynomial in the statistic for p-values right of [`TAU_STAR`].
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Finite-sample critical value coefficients `b0 + b1/T + b2/T^2 + b3/T^3`.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.04];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Critical values of the test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    /// 1% critical value.
    pub one_pct: f64,
    /// 5% critical value.
    pub five_pct: f64,
    /// 10% critical value.
    pub ten_pct: f64,
}

/// Outcome of an ADF test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// Symbol or spread label the test ran on.
    pub series_name: String,
    /// t-statistic of the lagged level coefficient.
    pub adf_statistic: f64,
    /// MacKinnon approximate p-value.
    pub p_value: f64,
    /// `p_value` below the configured significance.
    pub is_stationary: bool,
    /// Lag order chosen by AIC.
    pub used_lag: usize,
    /// Observations in the final regression.
    pub num_observations: usize,
    /// Critical values at `num_observations`.
    pub critical_values: CriticalValues,
    /// Length of the input series.
    pub sample_size: usize,
}

/// ADF test runner.
#[derive(Debug, Clone, Copy)]
pub struct AdfTest {
    min_periods: usize,
    max_lag: usize,
    significance: f64,
}

impl AdfTest {
    /// Creates a test runner.
    #[must_use]
    pub fn new(min_periods: usize, max_lag: usize, significance: f64) -> Self {
        Self {
            min_periods: min_periods.max(8),
            max_lag,
            significance,
        }
    }

    /// Creates a test runner from analytics configuration.
    #[must_use]
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(
            config.adf_min_periods,
            config.adf_max_lag,
            config.adf_significance,
        )
    }

    /// Runs the test on `series`.
    ///
    /// The maximum lag is reduced to `len / 2 - 2` for short series.
    ///
    /// # Errors
    ///
    /// Returns an error when the series is too short, contains non-finite
    /// values, or no regression can be fitted (e.g. a constant series).
    pub fn run(&self, name: &str, series: &[f64]) -> Result<AdfResult> {
        let n = series.len();
        if n < self.min_periods {
            return Err(AnalyticsError::InsufficientData {
                available: n,
                required: self.min_periods,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::NonFinite("ADF input series"));
        }

        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let max_lag = self.max_lag.min((n / 2).saturating_sub(2));

        let mut best: Option<(f64, usize)> = None;
        for lag in 0..=max_lag {
            match fit_lagged(series, &diffs, lag, max_lag) {
                Ok(fit) => {
                    let aic = fit.aic();
                    if best.is_none_or(|(best_aic, _)| aic < best_aic) {
                        best = Some((aic, lag));
                    }
                }
                Err(e) => trace!(series = name, lag, error = %e, "ADF lag candidate skipped"),
            }
        }
        let (_, used_lag) = best.ok_or(AnalyticsError::SingularMatrix)?;

        let fit = fit_lagged(series, &diffs, used_lag, used_lag)?;
        let adf_statistic = fit.t_value(0);
        if !adf_statistic.is_finite() {
            return Err(AnalyticsError::NonFinite("ADF statistic"));
        }

        let p_value = mackinnon_p_value(adf_statistic)?;
        Ok(AdfResult {
            series_name: name.to_string(),
            adf_statistic,
            p_value,
            is_stationary: p_value < self.significance,
            used_lag,
            num_observations: fit.nobs,
            critical_values: mackinnon_critical_values(fit.nobs),
            sample_size: n,
        })
    }
}

/// Fits the ADF regression with `lag` lagged differences on the rows whose
/// difference index starts at `start` (`start >= lag`).
///
/// Columns are `[level, constant, dx[t-1], ..., dx[t-lag]]`.
fn fit_lagged(series: &[f64], diffs: &[f64], lag: usize, start: usize) -> Result<OlsFit> {
    let rows: Vec<Vec<f64>> = (start..diffs.len())
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 2);
            row.push(series[t]);
            row.push(1.0);
            row.extend((1..=lag).map(|k| diffs[t - k]));
            row
        })
        .collect();
    let y = &diffs[start.min(diffs.len())..];
    OlsFit::fit(y, &rows)
}

/// MacKinnon (1994) approximate p-value for the constant-only ADF statistic.
///
/// # Errors
///
/// Returns an error if the normal distribution cannot be constructed.
pub fn mackinnon_p_value(statistic: f64) -> Result<f64> {
    if statistic > TAU_MAX {
        return Ok(1.0);
    }
    if statistic < TAU_MIN {
        return Ok(0.0);
    }
    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };
    normal_cdf(z)
}

/// MacKinnon (2010) critical values for `nobs` observations.
#[must_use]
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let t = nobs.max(1) as f64;
    let surface = |b: &[f64; 4]| b[0] + b[1] / t + b[2] / (t * t) + b[3] / (t * t * t);
    CriticalValues {
        one_pct: surface(&CRIT_1PCT),
        five_pct: surface(&CRIT_5PCT),
        ten_pct: surface(&CRIT_10PCT),
    }
}

/// Evaluates `c0 + c1*x + c2*x^2 + ...`.
fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Deterministic uniform noise in `[-1, 1)`.
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_p_value_at_asymptotic_critical_values() {
        assert_abs_diff_eq!(mackinnon_p_value(-2.86154).unwrap(), 0.05, epsilon = 2e-3);
        assert_abs_diff_eq!(mackinnon_p_value(-3.43035).unwrap(), 0.01, epsilon = 1e-3);
        assert_abs_diff_eq!(mackinnon_p_value(3.0).unwrap(), 1.0);
        assert_abs_diff_eq!(mackinnon_p_value(-25.0).unwrap(), 0.0);
    }

    #[test]
    fn test_p_value_is_continuous_and_monotone() {
        let left = mackinnon_p_value(TAU_STAR - 1e-9).unwrap();
        let right = mackinnon_p_value(TAU_STAR + 1e-9).unwrap();
        assert_abs_diff_eq!(left, right, epsilon = 2e-3);

        let mut previous = 0.0;
        for i in -60..=27 {
            let p = mackinnon_p_value(f64::from(i) / 10.0).unwrap();
            assert!(p >= previous - 1e-12);
            previous = p;
        }
    }

    #[test]
    fn test_critical_values() {
        let crit = mackinnon_critical_values(100);
        assert_abs_diff_eq!(crit.one_pct, -3.4975, epsilon = 1e-4);
        assert_abs_diff_eq!(crit.five_pct, -2.8909, epsilon = 1e-4);
        assert_abs_diff_eq!(crit.ten_pct, -2.5824, epsilon = 1e-4);
        assert!(crit.one_pct < crit.five_pct && crit.five_pct < crit.ten_pct);
    }

    #[test]
    fn test_mean_reverting_series_is_stationary() {
        let e = noise(100, 7);
        let mut series = vec![100.0];
        for shock in &e[1..] {
            let prev = series[series.len() - 1];
            series.push(100.0 + 0.5 * (prev - 100.0) + shock);
        }

        let result = AdfTest::new(30, 10, 0.05).run("AR1", &series).unwrap();
        assert!(result.adf_statistic < result.critical_values.five_pct);
        assert!(result.is_stationary);
        assert!(result.used_lag <= 10);
        assert_eq!(result.num_observations, 99 - result.used_lag);
        assert_eq!(result.sample_size, 100);
    }

    #[test]
    fn test_trending_walk_is_not_stationary() {
        let e = noise(100, 11);
        let mut series = vec![100.0];
        for shock in &e[1..] {
            let prev = series[series.len() - 1];
            series.push(prev + 0.5 + 0.2 * shock);
        }

        let result = AdfTest::new(30, 10, 0.05).run("walk", &series).unwrap();
        assert!(!result.is_stationary);
    }

    #[test]
    fn test_constant_series_has_no_result() {
        let result = AdfTest::new(30, 10, 0.05).run("flat", &[42.0; 60]);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_series() {
        let result = AdfTest::new(30, 10, 0.05).run("short", &[1.0; 29]);
        assert_eq!(
            result.unwrap_err(),
            AnalyticsError::InsufficientData {
                available: 29,
                required: 30
            }
        );
    }

    #[test]
    fn test_max_lag_is_clamped_for_short_series() {
        let e = noise(30, 3);
        let series: Vec<f64> = e.iter().map(|v| 50.0 + v).collect();
        let result = AdfTest::new(30, 50, 0.05).run("short-lag", &series).unwrap();
        assert!(result.used_lag <= 13);
    }
}
