//! Numeric helpers shared by the calculators.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::{AnalyticsError, Result};

/// Replaces NaN and infinities with zero.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Arithmetic mean; zero for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population (ddof = 0) standard deviation around `mean`.
pub(crate) fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Median; zero for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// 1-based ranks with ties sharing their average rank.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Two-sided p-value of a Student-t statistic.
pub(crate) fn student_t_p_value(t: f64, df: f64) -> Result<f64> {
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalyticsError::Distribution(e.to_string()))?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Standard normal CDF.
pub(crate) fn normal_cdf(x: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::Distribution(e.to_string()))?;
    Ok(dist.cdf(x))
}

/// Ordinary least squares fit with classical standard errors.
#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
    pub(crate) params: Vec<f64>,
    pub(crate) std_errors: Vec<f64>,
    pub(crate) ssr: f64,
    pub(crate) nobs: usize,
}

impl OlsFit {
    /// Fits `y = X b` by the normal equations. `rows` holds one regressor row
    /// per observation.
    pub(crate) fn fit(y: &[f64], rows: &[Vec<f64>]) -> Result<Self> {
        let nobs = y.len();
        let k = rows.first().map_or(0, Vec::len);
        if nobs != rows.len() || k == 0 || nobs <= k {
            return Err(AnalyticsError::InsufficientData {
                available: nobs,
                required: k + 1,
            });
        }

        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for (row, &yi) in rows.iter().zip(y) {
            for i in 0..k {
                xty[i] += row[i] * yi;
                for j in i..k {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..k {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
        }

        let inverse = invert(xtx)?;
        let params: Vec<f64> = (0..k)
            .map(|i| (0..k).map(|j| inverse[i][j] * xty[j]).sum())
            .collect();

        let ssr: f64 = rows
            .iter()
            .zip(y)
            .map(|(row, &yi)| {
                let fitted: f64 = row.iter().zip(&params).map(|(x, b)| x * b).sum();
                (yi - fitted).powi(2)
            })
            .sum();

        let sigma2 = ssr / (nobs - k) as f64;
        let std_errors = (0..k).map(|i| (sigma2 * inverse[i][i]).sqrt()).collect();

        Ok(Self {
            params,
            std_errors,
            ssr,
            nobs,
        })
    }

    /// Number of estimated parameters.
    pub(crate) fn k(&self) -> usize {
        self.params.len()
    }

    /// t-statistic of parameter `i`.
    pub(crate) fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Akaike information criterion under Gaussian errors.
    pub(crate) fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.k() as f64
    }
}

/// Gauss-Jordan inverse with partial pivoting.
fn invert(mut a: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let n = a.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max);
    if !scale.is_finite() {
        return Err(AnalyticsError::NonFinite("design matrix"));
    }
    let tolerance = scale * 1e-12;

    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= tolerance {
            return Err(AnalyticsError::SingularMatrix);
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in 0..n {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * a[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }

    Ok(inv)
}
