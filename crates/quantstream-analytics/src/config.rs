//! Analytics configuration.

use serde::{Deserialize, Serialize};

/// Minutes in a 252-day, 24-hour trading year.
const MINUTES_PER_TRADING_YEAR: f64 = 252.0 * 24.0 * 60.0;

/// Configuration for the analytics engine and its calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Rolling window length per symbol.
    pub window_size: usize,
    /// Minimum aligned samples for correlation.
    pub correlation_min_periods: usize,
    /// Minimum aligned samples for regression.
    pub regression_min_periods: usize,
    /// Minimum aligned samples for spread and ratio.
    pub spread_min_periods: usize,
    /// Minimum samples for the ADF test.
    pub adf_min_periods: usize,
    /// Largest lag order tried by the ADF lag search.
    pub adf_max_lag: usize,
    /// P-value below which a series is reported stationary.
    pub adf_significance: f64,
    /// Return periods per year used to annualize volatility.
    pub annualization_periods: f64,
}

impl AnalyticsConfig {
    /// Returns the volatility annualization factor, `sqrt(annualization_periods)`.
    #[must_use]
    pub fn annualization_factor(&self) -> f64 {
        self.annualization_periods.max(0.0).sqrt()
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            correlation_min_periods: 30,
            regression_min_periods: 30,
            spread_min_periods: 10,
            adf_min_periods: 30,
            adf_max_lag: 10,
            adf_significance: 0.05,
            annualization_periods: MINUTES_PER_TRADING_YEAR,
        }
    }
}
