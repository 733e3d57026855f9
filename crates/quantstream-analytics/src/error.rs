//! Error types for analytics calculations.

use thiserror::Error;

/// Result type alias for analytics calculations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Reasons a calculation produced no result.
///
/// The engine logs these and reports "no result" to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Fewer samples than the calculator needs.
    #[error("Insufficient data: {available} samples, {required} required")]
    InsufficientData {
        /// Samples available in the aligned window.
        available: usize,
        /// Samples the calculator requires.
        required: usize,
    },

    /// A series has zero variance, so the statistic is undefined.
    #[error("Series '{0}' is constant")]
    ConstantSeries(String),

    /// The regression design matrix cannot be inverted.
    #[error("Singular design matrix")]
    SingularMatrix,

    /// A value needed by the calculation is NaN or infinite.
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// A reference distribution could not be constructed.
    #[error("Distribution error: {0}")]
    Distribution(String),
}
