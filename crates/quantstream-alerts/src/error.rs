//! Alert errors.

use thiserror::Error;

/// Errors raised while evaluating a rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    /// A rule input was NaN or infinite.
    #[error("Non-finite {field} for {symbol}")]
    NonFinite {
        /// Symbol being evaluated.
        symbol: String,
        /// Input field that was not finite.
        field: &'static str,
    },
}
