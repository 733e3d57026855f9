//! Hedged spread and price ratio between two symbols.

use serde::{Deserialize, Serialize};

use crate::math::{finite_or_zero, mean, population_std};
use crate::{AnalyticsError, Result};

/// Hedged spread `price1 - hedge_ratio * price2` over aligned windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadResult {
    /// First (long) symbol.
    pub symbol1: String,
    /// Second (hedge) symbol.
    pub symbol2: String,
    /// Units of `symbol2` per unit of `symbol1`.
    pub hedge_ratio: f64,
    /// Newest spread value.
    pub current_spread: f64,
    /// Mean spread over the window.
    pub spread_mean: f64,
    /// Population standard deviation of the spread.
    pub spread_std: f64,
    /// Z-score of the newest spread; zero when the spread is constant.
    pub spread_zscore: f64,
    /// Number of aligned samples used.
    pub sample_size: usize,
}

/// Price ratio `price1 / price2` over aligned windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioResult {
    /// Numerator symbol.
    pub symbol1: String,
    /// Denominator symbol.
    pub symbol2: String,
    /// Newest ratio.
    pub current_ratio: f64,
    /// Mean ratio over the window.
    pub ratio_mean: f64,
    /// Population standard deviation of the ratio.
    pub ratio_std: f64,
    /// Z-score of the newest ratio; zero when the ratio is constant.
    pub ratio_zscore: f64,
    /// Number of aligned samples used.
    pub sample_size: usize,
}

/// Spread calculator over aligned price slices.
#[derive(Debug, Clone, Copy)]
pub struct SpreadCalculator {
    min_periods: usize,
}

impl SpreadCalculator {
    /// Creates a calculator requiring at least `min_periods` aligned samples.
    #[must_use]
    pub fn new(min_periods: usize) -> Self {
        Self {
            min_periods: min_periods.max(2),
        }
    }

    /// Returns the spread series over the aligned suffix, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `min_periods` samples are available.
    pub fn spread_series(
        &self,
        prices1: &[f64],
        prices2: &[f64],
        hedge_ratio: f64,
    ) -> Result<Vec<f64>> {
        let (a, b) = self.aligned(prices1, prices2)?;
        Ok(a.iter().zip(b).map(|(p1, p2)| p1 - hedge_ratio * p2).collect())
    }

    /// Computes the hedged spread and its z-score.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `min_periods` samples are available
    /// or the hedge ratio is not finite.
    pub fn calculate_spread(
        &self,
        symbol1: &str,
        prices1: &[f64],
        symbol2: &str,
        prices2: &[f64],
        hedge_ratio: f64,
    ) -> Result<SpreadResult> {
        if !hedge_ratio.is_finite() {
            return Err(AnalyticsError::NonFinite("hedge ratio"));
        }
        let spread = self.spread_series(prices1, prices2, hedge_ratio)?;
        let (current, mean, std, zscore) = summarize(&spread);

        Ok(SpreadResult {
            symbol1: symbol1.to_string(),
            symbol2: symbol2.to_string(),
            hedge_ratio,
            current_spread: current,
            spread_mean: mean,
            spread_std: std,
            spread_zscore: zscore,
            sample_size: spread.len(),
        })
    }

    /// Computes the price ratio and its z-score.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `min_periods` samples are available
    /// or any denominator price is zero.
    pub fn calculate_ratio(
        &self,
        symbol1: &str,
        prices1: &[f64],
        symbol2: &str,
        prices2: &[f64],
    ) -> Result<RatioResult> {
        let (a, b) = self.aligned(prices1, prices2)?;
        if b.iter().any(|p| *p == 0.0) {
            return Err(AnalyticsError::NonFinite("price ratio"));
        }
        let ratio: Vec<f64> = a.iter().zip(b).map(|(p1, p2)| p1 / p2).collect();
        let (current, mean, std, zscore) = summarize(&ratio);

        Ok(RatioResult {
            symbol1: symbol1.to_string(),
            symbol2: symbol2.to_string(),
            current_ratio: current,
            ratio_mean: mean,
            ratio_std: std,
            ratio_zscore: zscore,
            sample_size: ratio.len(),
        })
    }

    fn aligned<'a>(&self, prices1: &'a [f64], prices2: &'a [f64]) -> Result<(&'a [f64], &'a [f64])> {
        let n = prices1.len().min(prices2.len());
        if n < self.min_periods {
            return Err(AnalyticsError::InsufficientData {
                available: n,
                required: self.min_periods,
            });
        }
        Ok((&prices1[prices1.len() - n..], &prices2[prices2.len() - n..]))
    }
}

/// Returns `(current, mean, std, zscore)` of a non-empty series.
fn summarize(series: &[f64]) -> (f64, f64, f64, f64) {
    let current = series.last().copied().unwrap_or_default();
    let m = mean(series);
    let std = population_std(series, m);
    let zscore = if std > 0.0 { (current - m) / std } else { 0.0 };
    (
        finite_or_zero(current),
        finite_or_zero(m),
        finite_or_zero(std),
        finite_or_zero(zscore),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_spread_zscore() {
        let calc = SpreadCalculator::new(10);
        let p1 = vec![10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0, 14.0];
        let p2 = vec![5.0; 10];

        let result = calc.calculate_spread("A", &p1, "B", &p2, 2.0).unwrap();
        // Spreads are 0, 1, 0, 1, ..., 0, 4
        assert_abs_diff_eq!(result.current_spread, 4.0);
        assert_abs_diff_eq!(result.spread_mean, 0.8, epsilon = 1e-12);
        let std = ((4.0 * 0.64 + 4.0 * 0.04 + 0.64 + 10.24) / 10.0_f64).sqrt();
        assert_abs_diff_eq!(result.spread_std, std, epsilon = 1e-12);
        assert_abs_diff_eq!(result.spread_zscore, 3.2 / std, epsilon = 1e-12);
        assert_eq!(result.sample_size, 10);
    }

    #[test]
    fn test_constant_spread_has_zero_zscore() {
        let calc = SpreadCalculator::new(10);
        let p1: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i)).collect();
        let p2: Vec<f64> = (0..20).map(|i| 50.0 + f64::from(i)).collect();

        let result = calc.calculate_spread("A", &p1, "B", &p2, 1.0).unwrap();
        assert_abs_diff_eq!(result.current_spread, 50.0);
        assert_abs_diff_eq!(result.spread_std, 0.0);
        assert_abs_diff_eq!(result.spread_zscore, 0.0);
    }

    #[test]
    fn test_requires_ten_samples() {
        let calc = SpreadCalculator::new(10);
        let p = vec![1.0; 9];
        assert!(calc.calculate_spread("A", &p, "B", &p, 1.0).is_err());
        assert!(calc.calculate_ratio("A", &p, "B", &p).is_err());
    }

    #[test]
    fn test_ratio() {
        let calc = SpreadCalculator::new(2);
        let result = calc
            .calculate_ratio("A", &[20.0, 40.0], "B", &[10.0, 10.0])
            .unwrap();
        assert_abs_diff_eq!(result.current_ratio, 4.0);
        assert_abs_diff_eq!(result.ratio_mean, 3.0);
        assert_abs_diff_eq!(result.ratio_std, 1.0);
        assert_abs_diff_eq!(result.ratio_zscore, 1.0);
    }

    #[test]
    fn test_ratio_rejects_zero_denominator() {
        let calc = SpreadCalculator::new(2);
        assert!(calc.calculate_ratio("A", &[1.0, 2.0], "B", &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_uses_aligned_suffix() {
        let calc = SpreadCalculator::new(2);
        let series = calc.spread_series(&[1.0, 2.0, 3.0], &[10.0, 1.0], 1.0).unwrap();
        assert_eq!(series, vec![-8.0, 2.0]);
    }
}
