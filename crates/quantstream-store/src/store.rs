//! Sink contract.

use quantstream_aggregate::Ohlcv;
use quantstream_types::{Alert, AlertSeverity, Tick, Timeframe};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Number of records held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreCounts {
    /// Stored ticks.
    pub ticks: usize,
    /// Stored candles.
    pub ohlcv: usize,
    /// Stored alerts.
    pub alerts: usize,
}

/// Append/query sink for ticks, finalized candles and alerts.
///
/// Implementations are shared across the dispatch path and the query side,
/// so every method takes `&self`. Query results are newest first.
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Appends a batch of ticks.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be persisted.
    fn insert_ticks(&self, ticks: &[Tick]) -> Result<()>;

    /// Inserts a candle, replacing any candle with the same
    /// `(symbol, timestamp, timeframe)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the candle cannot be persisted.
    fn insert_ohlcv(&self, candle: &Ohlcv) -> Result<()>;

    /// Appends an alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the alert cannot be persisted.
    fn insert_alert(&self, alert: &Alert) -> Result<()>;

    /// Returns up to `limit` most recent ticks, optionally for one symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn query_ticks(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<Tick>>;

    /// Returns up to `limit` most recent candles for a symbol and timeframe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn query_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Ohlcv>>;

    /// Returns up to `limit` most recent alerts matching the filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn query_alerts(
        &self,
        symbol: Option<&str>,
        severity: Option<AlertSeverity>,
        limit: usize,
    ) -> Result<Vec<Alert>>;

    /// Returns record counts.
    fn counts(&self) -> StoreCounts;
}
