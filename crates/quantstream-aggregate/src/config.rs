//! Candle aggregation configuration.

use quantstream_types::Timeframe;
use serde::{Deserialize, Serialize};

/// Configuration for the candle aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleConfig {
    /// Timeframes aggregated for every symbol.
    pub timeframes: Vec<Timeframe>,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            timeframes: Timeframe::defaults(),
        }
    }
}
