//! Bounded per-symbol tick history.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use quantstream_types::{RollingWindow, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::{HandlerError, TickHandler};

/// Tick buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Ticks retained per symbol.
    pub max_ticks_per_symbol: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_ticks_per_symbol: 10_000,
        }
    }
}

/// Occupancy of a [`TickBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferStats {
    /// Number of buffered symbols.
    pub symbols: usize,
    /// Ticks across all symbols.
    pub total_ticks: usize,
    /// Ticks per symbol.
    pub per_symbol: BTreeMap<String, usize>,
}

/// Insertion-ordered tick history per symbol.
///
/// Each symbol keeps at most `capacity` ticks; the oldest is evicted first.
/// Unknown symbols read as empty.
#[derive(Debug)]
pub struct TickBuffer {
    capacity: usize,
    buffers: Mutex<BTreeMap<String, RollingWindow<Tick>>>,
}

impl TickBuffer {
    /// Creates a buffer retaining `capacity` ticks per symbol.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!(max_ticks_per_symbol = capacity, "tick buffer initialized");
        Self {
            capacity,
            buffers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates a buffer from configuration.
    #[must_use]
    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.max_ticks_per_symbol)
    }

    /// Returns the per-symbol capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a tick to its symbol's history.
    pub fn add(&self, tick: Tick) {
        let mut buffers = self.buffers.lock();
        match buffers.get_mut(&tick.symbol) {
            Some(window) => {
                window.push(tick);
            }
            None => {
                let mut window = RollingWindow::new(self.capacity);
                let symbol = tick.symbol.clone();
                window.push(tick);
                buffers.insert(symbol, window);
            }
        }
    }

    /// Returns the last `n` ticks for a symbol, oldest first.
    #[must_use]
    pub fn get_recent(&self, symbol: &str, n: usize) -> Vec<Tick> {
        self.buffers
            .lock()
            .get(symbol)
            .map(|window| window.tail(n))
            .unwrap_or_default()
    }

    /// Returns the ticks of a symbol stamped within `window` of now.
    #[must_use]
    pub fn get_by_age(&self, symbol: &str, window: TimeDelta) -> Vec<Tick> {
        self.get_by_age_at(symbol, window, Utc::now())
    }

    /// Returns the ticks of a symbol stamped at or after `now - window`.
    ///
    /// A window reaching past the representable time range keeps every tick.
    #[must_use]
    pub fn get_by_age_at(&self, symbol: &str, window: TimeDelta, now: DateTime<Utc>) -> Vec<Tick> {
        let cutoff = now.checked_sub_signed(window).unwrap_or_else(|| {
            if window > TimeDelta::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            }
        });
        self.buffers
            .lock()
            .get(symbol)
            .map(|ticks| {
                ticks
                    .iter()
                    .filter(|tick| tick.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the price of a symbol's most recent tick.
    #[must_use]
    pub fn get_latest_price(&self, symbol: &str) -> Option<f64> {
        self.buffers
            .lock()
            .get(symbol)
            .and_then(|window| window.last().map(|tick| tick.price))
    }

    /// Returns the number of ticks buffered for a symbol.
    #[must_use]
    pub fn len(&self, symbol: &str) -> usize {
        self.buffers.lock().get(symbol).map_or(0, RollingWindow::len)
    }

    /// Returns the buffered symbols, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.buffers.lock().keys().cloned().collect()
    }

    /// Returns buffer occupancy.
    #[must_use]
    pub fn stats(&self) -> BufferStats {
        let buffers = self.buffers.lock();
        let per_symbol: BTreeMap<String, usize> = buffers
            .iter()
            .map(|(symbol, window)| (symbol.clone(), window.len()))
            .collect();
        BufferStats {
            symbols: per_symbol.len(),
            total_ticks: per_symbol.values().sum(),
            per_symbol,
        }
    }

    /// Drops the history of one symbol, or of every symbol.
    pub fn clear(&self, symbol: Option<&str>) {
        let mut buffers = self.buffers.lock();
        match symbol {
            Some(symbol) => {
                buffers.remove(symbol);
            }
            None => buffers.clear(),
        }
    }
}

impl Default for TickBuffer {
    fn default() -> Self {
        Self::from_config(&BufferConfig::default())
    }
}

impl TickHandler for TickBuffer {
    fn name(&self) -> &str {
        "tick_buffer"
    }

    fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
        self.add(tick.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn tick(symbol: &str, second: i64, price: f64) -> Tick {
        Tick::new(symbol, t0() + TimeDelta::seconds(second), price, 1.0)
    }

    #[test]
    fn test_recent_is_bounded_and_ordered() {
        let buffer = TickBuffer::new(5);
        for i in 0..12 {
            buffer.add(tick("X", i, i as f64));
            assert!(buffer.len("X") <= 5);
        }

        let prices: Vec<f64> = buffer.get_recent("X", 3).iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![9.0, 10.0, 11.0]);

        let all: Vec<f64> = buffer.get_recent("X", 100).iter().map(|t| t.price).collect();
        assert_eq!(all, vec![7.0, 8.0, 9.0, 10.0, 11.0]);
        assert!(buffer.get_recent("X", 0).is_empty());
    }

    #[test]
    fn test_unknown_symbol() {
        let buffer = TickBuffer::default();
        assert_eq!(buffer.capacity(), 10_000);
        assert!(buffer.get_recent("NOPE", 10).is_empty());
        assert!(buffer.get_by_age("NOPE", TimeDelta::seconds(60)).is_empty());
        assert_eq!(buffer.get_latest_price("NOPE"), None);
        assert_eq!(buffer.len("NOPE"), 0);
    }

    #[test]
    fn test_get_by_age() {
        let buffer = TickBuffer::new(100);
        for i in 0..10 {
            buffer.add(tick("X", i * 10, i as f64));
        }
        // Ticks at 0, 10, ..., 90 seconds; now = 95s, window 30s keeps 70, 80, 90
        let now = t0() + TimeDelta::seconds(95);
        let recent = buffer.get_by_age_at("X", TimeDelta::seconds(30), now);
        let prices: Vec<f64> = recent.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_get_by_age_with_unbounded_window() {
        let buffer = TickBuffer::new(100);
        for i in 0..3 {
            buffer.add(tick("X", i, i as f64));
        }

        assert_eq!(buffer.get_by_age("X", TimeDelta::MAX).len(), 3);
        assert_eq!(buffer.get_by_age_at("X", TimeDelta::MAX, t0()).len(), 3);
        assert!(buffer.get_by_age_at("X", TimeDelta::MIN, t0()).is_empty());
    }

    #[test]
    fn test_latest_price_and_stats() {
        let buffer = TickBuffer::new(100);
        buffer.add(tick("B", 0, 10.0));
        buffer.add(tick("A", 0, 1.0));
        buffer.add(tick("A", 1, 2.0));

        assert_eq!(buffer.get_latest_price("A"), Some(2.0));
        assert_eq!(buffer.symbols(), vec!["A", "B"]);

        let stats = buffer.stats();
        assert_eq!(stats.symbols, 2);
        assert_eq!(stats.total_ticks, 3);
        assert_eq!(stats.per_symbol.get("A"), Some(&2));
    }

    #[test]
    fn test_clear() {
        let buffer = TickBuffer::new(100);
        buffer.add(tick("A", 0, 1.0));
        buffer.add(tick("B", 0, 1.0));

        buffer.clear(Some("A"));
        assert_eq!(buffer.symbols(), vec!["B"]);
        buffer.clear(None);
        assert_eq!(buffer.stats(), BufferStats::default());
    }

    #[test]
    fn test_concurrent_writers() {
        let buffer = std::sync::Arc::new(TickBuffer::new(1_000));
        let handles: Vec<_> = (0..4)
            .map(|w| {
                let buffer = std::sync::Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        buffer.add(tick(&format!("S{w}"), i, i as f64));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(buffer.stats().total_ticks, 2_000);
    }
}
