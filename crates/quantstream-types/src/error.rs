//! Error types for tick validation.

use thiserror::Error;

/// Result type alias for tick validation.
pub type Result<T> = std::result::Result<T, TickError>;

/// Errors raised when a tick fails validation at the ingestion boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    /// The symbol is empty.
    #[error("Tick has an empty symbol")]
    EmptySymbol,

    /// The timestamp could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The price is non-finite or not strictly positive.
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice {
        /// Symbol of the offending tick.
        symbol: String,
        /// The rejected price.
        price: f64,
    },

    /// The size is non-finite or negative.
    #[error("Invalid size {size} for {symbol}")]
    InvalidSize {
        /// Symbol of the offending tick.
        symbol: String,
        /// The rejected size.
        size: f64,
    },
}
