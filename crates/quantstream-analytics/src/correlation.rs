//! Pearson and Spearman correlation between two price series.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::math::{average_ranks, mean, student_t_p_value};
use crate::{AnalyticsError, Result};

/// Correlation estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear (product-moment) correlation.
    #[default]
    Pearson,
    /// Rank correlation.
    Spearman,
}

impl CorrelationMethod {
    /// Returns the method as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
        }
    }
}

impl std::fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            _ => Err(format!(
                "invalid correlation method '{s}', expected pearson or spearman"
            )),
        }
    }
}

/// Correlation between two symbols over their aligned windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// First symbol.
    pub symbol1: String,
    /// Second symbol.
    pub symbol2: String,
    /// Correlation coefficient in `[-1, 1]`.
    pub correlation: f64,
    /// Two-sided p-value for zero correlation.
    pub p_value: f64,
    /// Number of aligned samples used.
    pub sample_size: usize,
    /// Estimator used.
    pub method: CorrelationMethod,
}

/// Symmetric correlation matrix over the tracked symbols.
///
/// Seeded with the identity; a pair without enough data keeps its seed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Row and column labels.
    pub symbols: Vec<String>,
    /// Row-major coefficients.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Creates an identity matrix over `symbols`.
    #[must_use]
    pub fn identity(symbols: Vec<String>) -> Self {
        let n = symbols.len();
        let values = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { symbols, values }
    }

    /// Returns the coefficient for a pair of symbols.
    #[must_use]
    pub fn get(&self, symbol1: &str, symbol2: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == symbol1)?;
        let j = self.symbols.iter().position(|s| s == symbol2)?;
        Some(self.values[i][j])
    }
}

/// Correlation calculator over aligned price slices.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationCalculator {
    min_periods: usize,
}

impl CorrelationCalculator {
    /// Creates a calculator requiring at least `min_periods` aligned samples
    /// (never fewer than three).
    #[must_use]
    pub fn new(min_periods: usize) -> Self {
        Self {
            min_periods: min_periods.max(3),
        }
    }

    /// Returns the minimum number of aligned samples.
    #[must_use]
    pub const fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Correlates two aligned series of equal length.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `min_periods` samples are available
    /// or when either series is constant.
    pub fn calculate(
        &self,
        symbol1: &str,
        prices1: &[f64],
        symbol2: &str,
        prices2: &[f64],
        method: CorrelationMethod,
    ) -> Result<CorrelationResult> {
        let n = prices1.len().min(prices2.len());
        if n < self.min_periods {
            return Err(AnalyticsError::InsufficientData {
                available: n,
                required: self.min_periods,
            });
        }
        let x = &prices1[prices1.len() - n..];
        let y = &prices2[prices2.len() - n..];

        let correlation = match method {
            CorrelationMethod::Pearson => pearson(x, y, symbol1, symbol2)?,
            CorrelationMethod::Spearman => {
                pearson(&average_ranks(x), &average_ranks(y), symbol1, symbol2)?
            }
        };

        Ok(CorrelationResult {
            symbol1: symbol1.to_string(),
            symbol2: symbol2.to_string(),
            correlation,
            p_value: correlation_p_value(correlation, n)?,
            sample_size: n,
            method,
        })
    }
}

/// Product-moment correlation of two equal-length series.
fn pearson(x: &[f64], y: &[f64], name_x: &str, name_y: &str) -> Result<f64> {
    let mx = mean(x);
    let my = mean(y);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || !sxx.is_finite() {
        return Err(AnalyticsError::ConstantSeries(name_x.to_string()));
    }
    if syy <= 0.0 || !syy.is_finite() {
        return Err(AnalyticsError::ConstantSeries(name_y.to_string()));
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if !r.is_finite() {
        return Err(AnalyticsError::NonFinite("correlation"));
    }
    Ok(r.clamp(-1.0, 1.0))
}

/// Two-sided p-value of `r` under the t-test with `n - 2` degrees of freedom.
fn correlation_p_value(r: f64, n: usize) -> Result<f64> {
    let df = (n - 2) as f64;
    let denom = (1.0 - r) * (1.0 + r);
    if denom <= 0.0 {
        return Ok(0.0);
    }
    student_t_p_value(r * (df / denom).sqrt(), df)
}
