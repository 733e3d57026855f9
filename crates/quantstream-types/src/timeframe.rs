//! Candle aggregation timeframe definitions.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Candle aggregation timeframe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Timeframe {
    /// 1-second candles.
    #[serde(rename = "1s", alias = "s1")]
    Second1,
    /// 1-minute candles.
    #[default]
    #[serde(rename = "1m", alias = "1min", alias = "m1")]
    Minute1,
    /// 5-minute candles.
    #[serde(rename = "5m", alias = "5min", alias = "m5")]
    Minute5,
    /// 15-minute candles.
    #[serde(rename = "15m", alias = "15min", alias = "m15")]
    Minute15,
    /// 30-minute candles.
    #[serde(rename = "30m", alias = "30min", alias = "m30")]
    Minute30,
    /// 1-hour candles.
    #[serde(rename = "1h", alias = "1hour", alias = "h1")]
    Hour1,
    /// 4-hour candles.
    #[serde(rename = "4h", alias = "4hour", alias = "h4")]
    Hour4,
    /// Daily candles.
    #[serde(rename = "1d", alias = "1day", alias = "d1")]
    Day1,
}

impl Timeframe {
    /// Returns the duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        match self {
            Self::Second1 => 1,
            Self::Minute1 => 60,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1800,
            Self::Hour1 => 3600,
            Self::Hour4 => 14400,
            Self::Day1 => 86400,
        }
    }

    /// Returns the duration as a [`TimeDelta`].
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.seconds())
    }

    /// Returns the start of the bucket containing `timestamp`.
    ///
    /// Buckets are aligned to the Unix epoch:
    /// `floor(epoch_seconds / seconds) * seconds`.
    #[must_use]
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.seconds();
        let start = timestamp.timestamp().div_euclid(secs) * secs;
        DateTime::from_timestamp(start, 0).unwrap_or(timestamp)
    }

    /// Returns the timeframe as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Second1 => "1s",
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
        }
    }

    /// Returns all available timeframes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Second1,
            Self::Minute1,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour4,
            Self::Day1,
        ]
    }

    /// Returns the timeframes aggregated when none are configured.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::Second1, Self::Minute1, Self::Minute5]
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1s" | "s1" | "1sec" | "second" => Ok(Self::Second1),
            "1m" | "m1" | "1min" | "minute" => Ok(Self::Minute1),
            "5m" | "m5" | "5min" => Ok(Self::Minute5),
            "15m" | "m15" | "15min" => Ok(Self::Minute15),
            "30m" | "m30" | "30min" => Ok(Self::Minute30),
            "1h" | "h1" | "1hour" | "hour" => Ok(Self::Hour1),
            "4h" | "h4" | "4hour" => Ok(Self::Hour4),
            "1d" | "d1" | "1day" | "day" | "daily" => Ok(Self::Day1),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid timeframe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeParseError(String);

impl std::fmt::Display for TimeframeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid timeframe '{}', expected one of: 1s, 1m, 5m, 15m, 30m, 1h, 4h, 1d",
            self.0
        )
    }
}

impl std::error::Error for TimeframeParseError {}
