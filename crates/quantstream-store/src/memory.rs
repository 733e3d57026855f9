//! Bounded in-memory store.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use quantstream_aggregate::Ohlcv;
use quantstream_types::{Alert, AlertSeverity, Tick, Timeframe};
use std::collections::{BTreeMap, VecDeque};

use crate::{Result, Store, StoreCounts};

type CandleKey = (String, Timeframe, DateTime<Utc>);

#[derive(Debug, Default)]
struct MemoryState {
    ticks: VecDeque<Tick>,
    candles: BTreeMap<CandleKey, Ohlcv>,
    /// Candle keys in first-insert order, for eviction.
    candle_order: VecDeque<CandleKey>,
    alerts: VecDeque<Alert>,
}

/// In-memory store retaining at most `capacity` records of each kind.
///
/// The oldest records are evicted first.
#[derive(Debug)]
pub struct MemoryStore {
    capacity: usize,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates a store retaining up to `capacity` records of each kind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Returns the per-kind capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn insert_ticks(&self, ticks: &[Tick]) -> Result<()> {
        let mut state = self.state.lock();
        for tick in ticks {
            if state.ticks.len() == self.capacity {
                state.ticks.pop_front();
            }
            state.ticks.push_back(tick.clone());
        }
        Ok(())
    }

    fn insert_ohlcv(&self, candle: &Ohlcv) -> Result<()> {
        let key = (candle.symbol.clone(), candle.timeframe, candle.timestamp);
        let mut state = self.state.lock();
        if state.candles.insert(key.clone(), candle.clone()).is_none() {
            state.candle_order.push_back(key);
            if state.candle_order.len() > self.capacity
                && let Some(evicted) = state.candle_order.pop_front()
            {
                state.candles.remove(&evicted);
            }
        }
        Ok(())
    }

    fn insert_alert(&self, alert: &Alert) -> Result<()> {
        let mut state = self.state.lock();
        if state.alerts.len() == self.capacity {
            state.alerts.pop_front();
        }
        state.alerts.push_back(alert.clone());
        Ok(())
    }

    fn query_ticks(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<Tick>> {
        let state = self.state.lock();
        Ok(state
            .ticks
            .iter()
            .rev()
            .filter(|t| symbol.is_none_or(|s| t.symbol == s))
            .take(limit)
            .cloned()
            .collect())
    }

    fn query_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Ohlcv>> {
        let start = (symbol.to_string(), timeframe, DateTime::<Utc>::MIN_UTC);
        let end = (symbol.to_string(), timeframe, DateTime::<Utc>::MAX_UTC);
        let state = self.state.lock();
        Ok(state
            .candles
            .range(start..=end)
            .rev()
            .take(limit)
            .map(|(_, candle)| candle.clone())
            .collect())
    }

    fn query_alerts(
        &self,
        symbol: Option<&str>,
        severity: Option<AlertSeverity>,
        limit: usize,
    ) -> Result<Vec<Alert>> {
        let state = self.state.lock();
        Ok(state
            .alerts
            .iter()
            .rev()
            .filter(|a| symbol.is_none_or(|s| a.symbol == s))
            .filter(|a| severity.is_none_or(|s| a.severity == s))
            .take(limit)
            .cloned()
            .collect())
    }

    fn counts(&self) -> StoreCounts {
        let state = self.state.lock();
        StoreCounts {
            ticks: state.ticks.len(),
            ohlcv: state.candles.len(),
            alerts: state.alerts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use quantstream_types::AlertKind;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn candle(symbol: &str, minute: i64, close: f64) -> Ohlcv {
        Ohlcv {
            symbol: symbol.to_string(),
            timeframe: Timeframe::Minute1,
            timestamp: t0() + TimeDelta::minutes(minute),
            open: 1.0,
            high: close.max(1.0),
            low: close.min(1.0),
            close,
            volume: 1.0,
            trade_count: 1,
        }
    }

    fn alert(symbol: &str, severity: AlertSeverity) -> Alert {
        Alert {
            symbol: symbol.to_string(),
            timestamp: t0(),
            kind: AlertKind::ZscoreThreshold,
            message: "test".to_string(),
            severity,
            triggered_value: 3.5,
        }
    }

    #[test]
    fn test_ticks_are_bounded_and_newest_first() {
        let store = MemoryStore::new(3);
        let ticks: Vec<Tick> = (0..5)
            .map(|i| Tick::new("X", t0() + TimeDelta::seconds(i), 100.0 + i as f64, 1.0))
            .collect();
        store.insert_ticks(&ticks).unwrap();

        let recent = store.query_ticks(Some("X"), 10).unwrap();
        let prices: Vec<f64> = recent.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![104.0, 103.0, 102.0]);
        assert!(store.query_ticks(Some("Y"), 10).unwrap().is_empty());
        assert_eq!(store.counts().ticks, 3);
    }

    #[test]
    fn test_ohlcv_upsert() {
        let store = MemoryStore::default();
        store.insert_ohlcv(&candle("X", 0, 2.0)).unwrap();
        store.insert_ohlcv(&candle("X", 0, 3.0)).unwrap();
        store.insert_ohlcv(&candle("X", 1, 4.0)).unwrap();
        store.insert_ohlcv(&candle("Y", 0, 5.0)).unwrap();

        let candles = store.query_ohlcv("X", Timeframe::Minute1, 10).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 4.0);
        assert_eq!(candles[1].close, 3.0);
        assert!(store.query_ohlcv("X", Timeframe::Minute5, 10).unwrap().is_empty());
        assert_eq!(store.counts().ohlcv, 3);
    }

    #[test]
    fn test_ohlcv_eviction() {
        let store = MemoryStore::new(2);
        for minute in 0..4 {
            store.insert_ohlcv(&candle("X", minute, 2.0)).unwrap();
        }
        let candles = store.query_ohlcv("X", Timeframe::Minute1, 10).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].timestamp, t0() + TimeDelta::minutes(2));
    }

    #[test]
    fn test_alert_filters() {
        let store = MemoryStore::default();
        store.insert_alert(&alert("X", AlertSeverity::High)).unwrap();
        store.insert_alert(&alert("X", AlertSeverity::Low)).unwrap();
        store.insert_alert(&alert("Y", AlertSeverity::High)).unwrap();

        assert_eq!(store.query_alerts(None, None, 10).unwrap().len(), 3);
        assert_eq!(store.query_alerts(Some("X"), None, 10).unwrap().len(), 2);
        assert_eq!(
            store
                .query_alerts(None, Some(AlertSeverity::High), 10)
                .unwrap()
                .len(),
            2
        );
        let newest = store.query_alerts(None, None, 1).unwrap();
        assert_eq!(newest[0].symbol, "Y");
    }
}
