//! Streaming tick-to-OHLCV aggregation.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use quantstream_types::{Tick, Timeframe};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, trace};

use crate::{CandleConfig, Ohlcv};

/// Accumulator for the open bucket of one symbol and timeframe.
///
/// A builder is always seeded from a tick, so a finished candle always has an
/// open price.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleBuilder {
    symbol: String,
    timeframe: Timeframe,
    bucket_start: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    trade_count: u32,
}

impl CandleBuilder {
    /// Creates a new builder for `bucket_start`, seeded with its first tick.
    #[must_use]
    pub fn new(timeframe: Timeframe, bucket_start: DateTime<Utc>, tick: &Tick) -> Self {
        Self {
            symbol: tick.symbol.clone(),
            timeframe,
            bucket_start,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.size,
            trade_count: 1,
        }
    }

    /// Returns the start of the bucket being built.
    #[must_use]
    pub const fn bucket_start(&self) -> DateTime<Utc> {
        self.bucket_start
    }

    /// Folds a tick into the builder.
    pub fn update(&mut self, tick: &Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume += tick.size;
        self.trade_count += 1;
    }

    /// Returns the candle as it stands, without finalizing it.
    #[must_use]
    pub fn snapshot(&self) -> Ohlcv {
        self.clone().finish()
    }

    /// Finishes building and returns the candle.
    #[must_use]
    pub fn finish(self) -> Ohlcv {
        Ohlcv {
            symbol: self.symbol,
            timeframe: self.timeframe,
            timestamp: self.bucket_start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            trade_count: self.trade_count,
        }
    }
}

/// Thread-safe candle aggregator over every symbol and configured timeframe.
///
/// Per (symbol, timeframe) the state machine is: no builder, then an open
/// builder that absorbs ticks of its bucket, then emit-and-reopen when a tick
/// maps to a later bucket. Ticks that map to an earlier bucket than the open
/// one are folded into the open builder; late arrivals are not corrected.
#[derive(Debug)]
pub struct CandleAggregator {
    timeframes: Vec<Timeframe>,
    builders: Mutex<HashMap<String, HashMap<Timeframe, CandleBuilder>>>,
}

impl CandleAggregator {
    /// Creates an aggregator for the given timeframes.
    ///
    /// Duplicates are ignored; an empty list falls back to the defaults.
    #[must_use]
    pub fn new(timeframes: impl IntoIterator<Item = Timeframe>) -> Self {
        let mut timeframes: Vec<Timeframe> = timeframes.into_iter().collect();
        timeframes.sort_unstable();
        timeframes.dedup();
        if timeframes.is_empty() {
            timeframes = Timeframe::defaults();
        }

        info!(
            timeframes = ?timeframes.iter().map(Timeframe::as_str).collect::<Vec<_>>(),
            "candle aggregator initialized"
        );

        Self {
            timeframes,
            builders: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an aggregator from configuration.
    #[must_use]
    pub fn from_config(config: &CandleConfig) -> Self {
        Self::new(config.timeframes.iter().copied())
    }

    /// Returns the aggregated timeframes, shortest first.
    #[must_use]
    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    /// Folds a tick into every timeframe of its symbol.
    ///
    /// Returns the candles finalized by this tick, at most one per timeframe.
    pub fn add_tick(&self, tick: &Tick) -> Vec<Ohlcv> {
        let mut completed = Vec::new();
        let mut builders = self.builders.lock();
        let per_symbol = builders.entry(tick.symbol.clone()).or_default();

        for &timeframe in &self.timeframes {
            let bucket_start = timeframe.bucket_start(tick.timestamp);

            match per_symbol.entry(timeframe) {
                Entry::Vacant(slot) => {
                    slot.insert(CandleBuilder::new(timeframe, bucket_start, tick));
                }
                Entry::Occupied(mut slot) => {
                    let builder = slot.get_mut();
                    if bucket_start > builder.bucket_start() {
                        let fresh = CandleBuilder::new(timeframe, bucket_start, tick);
                        let candle = std::mem::replace(builder, fresh).finish();
                        debug!(
                            symbol = %candle.symbol,
                            timeframe = %timeframe,
                            timestamp = %candle.timestamp,
                            close = candle.close,
                            trades = candle.trade_count,
                            "candle finalized"
                        );
                        completed.push(candle);
                    } else {
                        if bucket_start < builder.bucket_start() {
                            trace!(
                                symbol = %tick.symbol,
                                timeframe = %timeframe,
                                tick_time = %tick.timestamp,
                                "late tick folded into open candle"
                            );
                        }
                        builder.update(tick);
                    }
                }
            }
        }

        completed
    }

    /// Returns the in-flight candle for a symbol and timeframe without finalizing it.
    #[must_use]
    pub fn get_current(&self, symbol: &str, timeframe: Timeframe) -> Option<Ohlcv> {
        self.builders
            .lock()
            .get(symbol)
            .and_then(|per_symbol| per_symbol.get(&timeframe))
            .map(CandleBuilder::snapshot)
    }

    /// Finalizes and returns every open candle, leaving the aggregator empty.
    pub fn flush(&self) -> Vec<Ohlcv> {
        let mut candles: Vec<Ohlcv> = self
            .builders
            .lock()
            .drain()
            .flat_map(|(_, per_symbol)| per_symbol.into_values())
            .map(CandleBuilder::finish)
            .collect();
        candles.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then(a.timeframe.cmp(&b.timeframe))
        });
        candles
    }

    /// Drops open builders for one symbol, or for every symbol.
    pub fn clear(&self, symbol: Option<&str>) {
        let mut builders = self.builders.lock();
        match symbol {
            Some(symbol) => {
                builders.remove(symbol);
            }
            None => builders.clear(),
        }
    }

    /// Returns the number of open builders across all symbols.
    #[must_use]
    pub fn open_candle_count(&self) -> usize {
        self.builders.lock().values().map(HashMap::len).sum()
    }
}

impl Default for CandleAggregator {
    fn default() -> Self {
        Self::new(Timeframe::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn make_tick(offset_secs: i64, price: f64, size: f64) -> Tick {
        Tick::new("BTCUSDT", t0() + TimeDelta::seconds(offset_secs), price, size)
    }

    #[test]
    fn test_minute_aggregation() {
        let agg = CandleAggregator::new([Timeframe::Minute1]);

        assert!(agg.add_tick(&make_tick(0, 100.0, 1.0)).is_empty());
        assert!(agg.add_tick(&make_tick(1, 102.0, 2.0)).is_empty());

        let bars = agg.add_tick(&make_tick(60, 99.0, 3.0));
        assert_eq!(bars.len(), 1);
        let bar = &bars[0];
        assert_eq!(bar.timestamp, t0());
        assert_eq!(bar.trade_count, 2);
        assert!((bar.open - 100.0).abs() < 1e-10);
        assert!((bar.close - 102.0).abs() < 1e-10);
        assert!((bar.high - 102.0).abs() < 1e-10);
        assert!((bar.low - 100.0).abs() < 1e-10);
        assert!((bar.volume - 3.0).abs() < 1e-10);

        // The third tick seeded the next bucket
        assert!(agg.add_tick(&make_tick(61, 98.0, 1.0)).is_empty());
        let current = agg.get_current("BTCUSDT", Timeframe::Minute1).unwrap();
        assert_eq!(current.timestamp, t0() + TimeDelta::seconds(60));
        assert_eq!(current.trade_count, 2);
        assert!((current.open - 99.0).abs() < 1e-10);
    }

    #[test]
    fn test_multiple_timeframes_finalize_independently() {
        let agg = CandleAggregator::new([Timeframe::Second1, Timeframe::Minute1]);

        assert!(agg.add_tick(&make_tick(0, 100.0, 1.0)).is_empty());

        let bars = agg.add_tick(&make_tick(1, 101.0, 1.0));
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timeframe, Timeframe::Second1);

        let bars = agg.add_tick(&make_tick(60, 102.0, 1.0));
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timeframe, Timeframe::Second1);
        assert_eq!(bars[1].timeframe, Timeframe::Minute1);
        assert_eq!(bars[1].trade_count, 2);
    }

    #[test]
    fn test_symbols_are_independent() {
        let agg = CandleAggregator::new([Timeframe::Minute1]);
        agg.add_tick(&make_tick(0, 100.0, 1.0));
        agg.add_tick(&Tick::new("ETHUSDT", t0() + TimeDelta::seconds(120), 10.0, 1.0));

        assert_eq!(agg.open_candle_count(), 2);
        let btc = agg.get_current("BTCUSDT", Timeframe::Minute1).unwrap();
        assert_eq!(btc.timestamp, t0());
    }

    #[test]
    fn test_late_tick_is_folded_into_open_bucket() {
        let agg = CandleAggregator::new([Timeframe::Minute1]);
        agg.add_tick(&make_tick(60, 100.0, 1.0));

        // Belongs to the previous minute, which was never opened
        assert!(agg.add_tick(&make_tick(5, 90.0, 2.0)).is_empty());

        let current = agg.get_current("BTCUSDT", Timeframe::Minute1).unwrap();
        assert_eq!(current.timestamp, t0() + TimeDelta::seconds(60));
        assert_eq!(current.trade_count, 2);
        assert!((current.low - 90.0).abs() < 1e-10);
        assert!((current.close - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_get_current_does_not_finalize() {
        let agg = CandleAggregator::new([Timeframe::Minute1]);
        agg.add_tick(&make_tick(0, 100.0, 1.0));

        assert!(agg.get_current("BTCUSDT", Timeframe::Minute1).is_some());
        assert!(agg.get_current("BTCUSDT", Timeframe::Minute5).is_none());
        assert!(agg.get_current("ETHUSDT", Timeframe::Minute1).is_none());
        assert_eq!(agg.open_candle_count(), 1);
    }

    #[test]
    fn test_flush() {
        let agg = CandleAggregator::new([Timeframe::Minute1, Timeframe::Minute5]);
        agg.add_tick(&make_tick(0, 100.0, 1.0));

        let bars = agg.flush();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timeframe, Timeframe::Minute1);
        assert_eq!(bars[1].timeframe, Timeframe::Minute5);
        assert_eq!(agg.open_candle_count(), 0);
    }

    #[test]
    fn test_clear() {
        let agg = CandleAggregator::new([Timeframe::Minute1]);
        agg.add_tick(&make_tick(0, 100.0, 1.0));
        agg.add_tick(&Tick::new("ETHUSDT", t0(), 10.0, 1.0));

        agg.clear(Some("BTCUSDT"));
        assert_eq!(agg.open_candle_count(), 1);
        agg.clear(None);
        assert_eq!(agg.open_candle_count(), 0);
    }

    #[test]
    fn test_timeframes_deduplicated() {
        let agg = CandleAggregator::new([Timeframe::Minute5, Timeframe::Second1, Timeframe::Minute5]);
        assert_eq!(agg.timeframes(), &[Timeframe::Second1, Timeframe::Minute5]);
        assert_eq!(CandleAggregator::new(Vec::new()).timeframes().len(), 3);
    }
}
