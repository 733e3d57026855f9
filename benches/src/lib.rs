//! Benchmark utilities for quantstream.

use chrono::{DateTime, TimeDelta, Utc};
use quantstream_lib::{Config, LogNotifier, MemoryStore, Pipeline, Tick};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deterministic random-walk tick generator.
#[derive(Debug, Clone)]
pub struct TickGenerator {
    symbols: Vec<String>,
    prices: Vec<f64>,
    start: DateTime<Utc>,
    step: TimeDelta,
    state: u64,
    emitted: i64,
}

impl TickGenerator {
    /// Creates a generator cycling through `symbols`, one tick every
    /// `step_ms` milliseconds.
    pub fn new(symbols: &[&str], step_ms: i64, seed: u64) -> Self {
        Self {
            symbols: symbols.iter().map(|s| (*s).to_string()).collect(),
            prices: vec![100.0; symbols.len()],
            start: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
            step: TimeDelta::milliseconds(step_ms),
            state: seed,
            emitted: 0,
        }
    }

    /// Returns the next `n` ticks.
    pub fn take(&mut self, n: usize) -> Vec<Tick> {
        (0..n).map(|_| self.next_tick()).collect()
    }

    fn next_tick(&mut self) -> Tick {
        let index = (self.emitted as usize) % self.symbols.len().max(1);
        let shock = self.uniform() - 0.5;
        let price = (self.prices[index] * (1.0 + shock * 0.002)).max(0.01);
        self.prices[index] = price;

        let size = 0.1 + self.uniform() * 2.0;
        let timestamp = self.start + self.step * self.emitted as i32;
        self.emitted += 1;
        Tick::new(self.symbols[index].clone(), timestamp, price, size)
    }

    /// Uniform sample in `[0, 1)`.
    fn uniform(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Builds a pipeline over an in-memory store.
pub fn memory_pipeline(config: Config) -> Option<Pipeline> {
    Pipeline::new(
        config,
        Arc::new(LogNotifier::new()),
        Arc::new(MemoryStore::default()),
    )
    .ok()
}

/// Result of a single throughput measurement.
#[derive(Debug, Clone)]
pub struct ThroughputResult {
    /// Stage measured.
    pub stage: String,
    /// Ticks processed.
    pub ticks: usize,
    /// Wall time.
    pub duration: Duration,
}

impl ThroughputResult {
    /// Calculate ticks per second.
    pub fn ticks_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate mean latency per tick in microseconds.
    pub fn micros_per_tick(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.duration.as_secs_f64() * 1e6 / self.ticks as f64
        }
    }
}

/// Times `f` over every tick.
pub fn measure(stage: &str, ticks: &[Tick], mut f: impl FnMut(&Tick)) -> ThroughputResult {
    let started = Instant::now();
    for tick in ticks {
        f(tick);
    }
    ThroughputResult {
        stage: stage.to_string(),
        ticks: ticks.len(),
        duration: started.elapsed(),
    }
}
