//! Z-score of the newest price.

use serde::{Deserialize, Serialize};

use crate::PriceStats;
use crate::math::finite_or_zero;

/// Outlier band of a z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierLevel {
    /// `|z| <= 1`.
    Normal,
    /// `1 < |z| <= 2`.
    Moderate,
    /// `2 < |z| <= 3`.
    High,
    /// `|z| > 3`.
    Extreme,
}

impl OutlierLevel {
    /// Classifies a z-score.
    #[must_use]
    pub fn from_zscore(zscore: f64) -> Self {
        let abs = zscore.abs();
        if abs > 3.0 {
            Self::Extreme
        } else if abs > 2.0 {
            Self::High
        } else if abs > 1.0 {
            Self::Moderate
        } else {
            Self::Normal
        }
    }

    /// Returns the level as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

impl std::fmt::Display for OutlierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Z-score of a price against a mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreResult {
    /// Instrument symbol.
    pub symbol: String,
    /// `(price - mean) / std`, or zero when `std` is zero.
    pub zscore: f64,
    /// Outlier band of `zscore`.
    pub outlier_level: OutlierLevel,
    /// Price that was scored.
    pub current_price: f64,
    /// Reference mean.
    pub mean: f64,
    /// Reference standard deviation.
    pub std: f64,
    /// `|z| > 1`.
    pub is_outlier_1sigma: bool,
    /// `|z| > 2`.
    pub is_outlier_2sigma: bool,
    /// `|z| > 3`.
    pub is_outlier_3sigma: bool,
}

impl ZScoreResult {
    /// Scores the newest price of a snapshot against the window that preceded it.
    #[must_use]
    pub fn from_stats(stats: &PriceStats) -> Self {
        calculate_zscore(
            &stats.symbol,
            stats.current_price,
            stats.baseline_mean,
            stats.baseline_std,
        )
    }
}

/// Computes the z-score of `price` against `mean` and `std`.
///
/// A zero (or non-finite) standard deviation yields a z-score of zero and
/// level [`OutlierLevel::Normal`].
#[must_use]
pub fn calculate_zscore(symbol: &str, price: f64, mean: f64, std: f64) -> ZScoreResult {
    let zscore = if std > 0.0 && std.is_finite() {
        finite_or_zero((price - mean) / std)
    } else {
        0.0
    };
    let abs = zscore.abs();

    ZScoreResult {
        symbol: symbol.to_string(),
        zscore,
        outlier_level: OutlierLevel::from_zscore(zscore),
        current_price: price,
        mean,
        std,
        is_outlier_1sigma: abs > 1.0,
        is_outlier_2sigma: abs > 2.0,
        is_outlier_3sigma: abs > 3.0,
    }
}
