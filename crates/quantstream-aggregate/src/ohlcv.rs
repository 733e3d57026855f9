//! OHLCV (candlestick) data structure.

use chrono::{DateTime, Utc};
use quantstream_types::Timeframe;
use serde::{Deserialize, Serialize};

/// Finalized OHLCV candle.
///
/// Uniquely identified by `(symbol, timestamp, timeframe)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Instrument symbol.
    pub symbol: String,
    /// Aggregation timeframe.
    pub timeframe: Timeframe,
    /// Bucket open time (start of the period).
    pub timestamp: DateTime<Utc>,
    /// First traded price in the bucket.
    pub open: f64,
    /// Highest traded price in the bucket.
    pub high: f64,
    /// Lowest traded price in the bucket.
    pub low: f64,
    /// Last traded price in the bucket.
    pub close: f64,
    /// Sum of traded sizes.
    pub volume: f64,
    /// Number of trades folded into the candle.
    pub trade_count: u32,
}

impl Ohlcv {
    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the body size (|close - open|).
    #[must_use]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Returns true if this is a bullish (green) candle.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns true if this is a bearish (red) candle.
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns the end of the bucket (exclusive).
    #[must_use]
    pub fn close_time(&self) -> DateTime<Utc> {
        self.timestamp + self.timeframe.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_bar(open: f64, close: f64) -> Ohlcv {
        Ohlcv {
            symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::Minute1,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            open,
            high: 105.0,
            low: 98.0,
            close,
            volume: 10.0,
            trade_count: 5,
        }
    }

    #[test]
    fn test_range_and_body() {
        let bar = create_test_bar(100.0, 102.0);
        assert!((bar.range() - 7.0).abs() < 1e-10);
        assert!((bar.body() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_direction() {
        assert!(create_test_bar(100.0, 102.0).is_bullish());
        assert!(create_test_bar(102.0, 100.0).is_bearish());
        let flat = create_test_bar(100.0, 100.0);
        assert!(!flat.is_bullish() && !flat.is_bearish());
    }

    #[test]
    fn test_close_time() {
        let bar = create_test_bar(100.0, 102.0);
        assert_eq!(
            bar.close_time(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap()
        );
    }

    #[test]
    fn test_serializes_timeframe_name() {
        let json = serde_json::to_string(&create_test_bar(1.0, 2.0)).unwrap();
        assert!(json.contains("\"timeframe\":\"1m\""));
        assert!(json.contains("\"timestamp\":\"2024-01-01T12:00:00Z\""));
    }
}
