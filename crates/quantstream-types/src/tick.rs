//! Trade tick representation.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::TickError;

/// A single trade for one symbol.
///
/// Ticks are immutable once constructed; every downstream component reads
/// them by reference or stores its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Trade time (UTC).
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Trade price.
    pub price: f64,
    /// Traded quantity.
    #[serde(alias = "quantity", alias = "qty")]
    pub size: f64,
    /// Exchange trade identifier, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<u64>,
    /// Whether the buyer was the maker, when the source provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_buyer_maker: Option<bool>,
}

impl Tick {
    /// Creates a new tick without the optional exchange fields.
    #[must_use]
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>, price: f64, size: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            price,
            size,
            trade_id: None,
            is_buyer_maker: None,
        }
    }

    /// Sets the exchange trade identifier.
    #[must_use]
    pub const fn with_trade_id(mut self, trade_id: u64) -> Self {
        self.trade_id = Some(trade_id);
        self
    }

    /// Sets the buyer-is-maker flag.
    #[must_use]
    pub const fn with_buyer_maker(mut self, is_buyer_maker: bool) -> Self {
        self.is_buyer_maker = Some(is_buyer_maker);
        self
    }

    /// Returns the traded notional (price * size).
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.size
    }

    /// Checks that the tick can safely enter the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty symbol, a non-finite or non-positive
    /// price, or a non-finite or negative size.
    pub fn validate(&self) -> crate::Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(TickError::EmptySymbol);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(TickError::InvalidPrice {
                symbol: self.symbol.clone(),
                price: self.price,
            });
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(TickError::InvalidSize {
                symbol: self.symbol.clone(),
                size: self.size,
            });
        }
        Ok(())
    }
}

/// Parses a timestamp from RFC 3339, naive ISO-8601 (taken as UTC) or
/// integer epoch milliseconds.
///
/// # Errors
///
/// Returns [`TickError::InvalidTimestamp`] if no format matches.
pub fn parse_timestamp(raw: &str) -> crate::Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| TickError::InvalidTimestamp(raw.to_string()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Text(String),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("epoch milliseconds out of range: {ms}"))),
        RawTimestamp::Text(text) => parse_timestamp(&text).map_err(D::Error::custom),
    }
}
