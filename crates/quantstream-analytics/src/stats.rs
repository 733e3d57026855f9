//! Rolling price statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::math::{finite_or_zero, mean, median, population_std};

/// Snapshot of rolling statistics for one symbol.
///
/// Recomputed from the current window on every update. Every field is finite:
/// NaN or infinite intermediates are reported as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    /// Instrument symbol.
    pub symbol: String,
    /// Timestamp of the newest tick in the window.
    pub timestamp: DateTime<Utc>,
    /// Newest price.
    pub current_price: f64,
    /// Mean price over the window.
    pub mean: f64,
    /// Median price over the window.
    pub median: f64,
    /// Population standard deviation of price over the window.
    pub std: f64,
    /// Lowest price in the window.
    pub min: f64,
    /// Highest price in the window.
    pub max: f64,
    /// `max - min`.
    pub range: f64,
    /// Number of ticks in the window.
    pub count: usize,
    /// Sum of sizes in the window.
    pub total_volume: f64,
    /// Mean size per tick.
    pub avg_volume: f64,
    /// Population standard deviation of size.
    pub volume_std: f64,
    /// Newest price minus oldest price.
    pub price_change: f64,
    /// Price change relative to the oldest price, in percent.
    pub price_change_pct: f64,
    /// Volume-weighted average price; the mean when the window has no volume.
    pub vwap: f64,
    /// Annualized standard deviation of simple returns.
    pub volatility: f64,
    /// Mean of the window excluding the newest price.
    pub baseline_mean: f64,
    /// Population standard deviation of the window excluding the newest price.
    pub baseline_std: f64,
}

impl PriceStats {
    /// Computes statistics over aligned price and size windows.
    ///
    /// Returns `None` with fewer than two prices.
    #[must_use]
    pub fn compute(
        symbol: &str,
        timestamp: DateTime<Utc>,
        prices: &[f64],
        sizes: &[f64],
        annualization_factor: f64,
    ) -> Option<Self> {
        if prices.len() < 2 {
            return None;
        }

        let current_price = prices[prices.len() - 1];
        let first_price = prices[0];

        let price_mean = mean(prices);
        let price_std = population_std(prices, price_mean);
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let total_volume: f64 = sizes.iter().sum();
        let avg_volume = mean(sizes);
        let volume_std = population_std(sizes, avg_volume);

        let price_change_pct = if first_price > 0.0 {
            (current_price - first_price) / first_price * 100.0
        } else {
            0.0
        };

        let vwap = if total_volume > 0.0 {
            prices.iter().zip(sizes).map(|(p, s)| p * s).sum::<f64>() / total_volume
        } else {
            price_mean
        };

        let baseline = &prices[..prices.len() - 1];
        let baseline_mean = mean(baseline);
        let baseline_std = population_std(baseline, baseline_mean);

        Some(Self {
            symbol: symbol.to_string(),
            timestamp,
            current_price: finite_or_zero(current_price),
            mean: finite_or_zero(price_mean),
            median: finite_or_zero(median(prices)),
            std: finite_or_zero(price_std),
            min: finite_or_zero(min),
            max: finite_or_zero(max),
            range: finite_or_zero(max - min),
            count: prices.len(),
            total_volume: finite_or_zero(total_volume),
            avg_volume: finite_or_zero(avg_volume),
            volume_std: finite_or_zero(volume_std),
            price_change: finite_or_zero(current_price - first_price),
            price_change_pct: finite_or_zero(price_change_pct),
            vwap: finite_or_zero(vwap),
            volatility: finite_or_zero(annualized_volatility(prices, annualization_factor)),
            baseline_mean: finite_or_zero(baseline_mean),
            baseline_std: finite_or_zero(baseline_std),
        })
    }
}

/// Standard deviation of simple returns between consecutive positive prices,
/// scaled by `factor`.
fn annualized_volatility(prices: &[f64], factor: f64) -> f64 {
    let valid: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect();

    let returns: Vec<f64> = valid
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect();

    if returns.is_empty() {
        return 0.0;
    }
    population_std(&returns, mean(&returns)) * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FACTOR: f64 = 602.395_218_6;

    fn compute(prices: &[f64], sizes: &[f64]) -> Option<PriceStats> {
        PriceStats::compute("BTCUSDT", Utc::now(), prices, sizes, FACTOR)
    }

    #[test]
    fn test_requires_two_prices() {
        assert!(compute(&[], &[]).is_none());
        assert!(compute(&[100.0], &[1.0]).is_none());
        assert!(compute(&[100.0, 101.0], &[1.0, 1.0]).is_some());
    }

    #[test]
    fn test_basic_statistics() {
        let stats = compute(&[100.0, 102.0, 101.0, 105.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(stats.count, 4);
        assert_abs_diff_eq!(stats.current_price, 105.0);
        assert_abs_diff_eq!(stats.mean, 102.0);
        assert_abs_diff_eq!(stats.median, 101.5);
        assert_abs_diff_eq!(stats.std, 3.5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(stats.min, 100.0);
        assert_abs_diff_eq!(stats.max, 105.0);
        assert_abs_diff_eq!(stats.range, 5.0);
        assert_abs_diff_eq!(stats.total_volume, 10.0);
        assert_abs_diff_eq!(stats.avg_volume, 2.5);
        assert_abs_diff_eq!(stats.volume_std, 1.25_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(stats.price_change, 5.0);
        assert_abs_diff_eq!(stats.price_change_pct, 5.0, epsilon = 1e-12);
        // (100 + 204 + 303 + 420) / 10
        assert_abs_diff_eq!(stats.vwap, 102.7, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.baseline_mean, 101.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_series() {
        let stats = compute(&[50.0; 10], &[1.0; 10]).unwrap();
        assert_abs_diff_eq!(stats.std, 0.0);
        assert_abs_diff_eq!(stats.baseline_std, 0.0);
        assert_abs_diff_eq!(stats.volatility, 0.0);
        assert_abs_diff_eq!(stats.price_change_pct, 0.0);
    }

    #[test]
    fn test_increasing_series_has_positive_change() {
        let prices: Vec<f64> = (1..=20).map(f64::from).collect();
        let stats = compute(&prices, &vec![1.0; prices.len()]).unwrap();
        assert!(stats.price_change_pct > 0.0);
        assert!(stats.price_change > 0.0);
        assert!(stats.volatility > 0.0);
    }

    #[test]
    fn test_vwap_falls_back_to_mean_without_volume() {
        let stats = compute(&[10.0, 20.0], &[0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(stats.vwap, 15.0);
    }

    #[test]
    fn test_volatility_of_alternating_returns() {
        // Returns are +10% and -10%/1.1, computed directly
        let prices = [100.0, 110.0, 100.0];
        let r1 = 0.1;
        let r2 = (100.0 - 110.0) / 110.0;
        let m = (r1 + r2) / 2.0;
        let expected = (((r1 - m) * (r1 - m) + (r2 - m) * (r2 - m)) / 2.0_f64).sqrt() * FACTOR;

        let stats = compute(&prices, &[1.0; 3]).unwrap();
        assert_abs_diff_eq!(stats.volatility, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_values_are_clamped() {
        let stats = compute(&[100.0, f64::INFINITY], &[1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(stats.current_price, 0.0);
        assert_abs_diff_eq!(stats.mean, 0.0);
        assert!(stats.volatility.is_finite());
    }
}
