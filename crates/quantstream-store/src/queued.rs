//! Bounded write queue in front of a store.

use parking_lot::Mutex;
use quantstream_aggregate::Ohlcv;
use quantstream_types::{Alert, AlertSeverity, Tick, Timeframe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Result, Store, StoreCounts, StoreError};

#[derive(Debug)]
enum Write {
    Ticks(Vec<Tick>),
    Ohlcv(Ohlcv),
    Alert(Alert),
}

impl Write {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Ticks(_) => "ticks",
            Self::Ohlcv(_) => "ohlcv",
            Self::Alert(_) => "alert",
        }
    }

    fn apply(self, store: &dyn Store) -> Result<()> {
        match self {
            Self::Ticks(ticks) => store.insert_ticks(&ticks),
            Self::Ohlcv(candle) => store.insert_ohlcv(&candle),
            Self::Alert(alert) => store.insert_alert(&alert),
        }
    }
}

/// Wraps a store behind a bounded queue drained on a blocking worker.
///
/// Inserts never wait: when the queue is full the record is dropped and
/// [`StoreError::QueueFull`] is returned. Queries go straight to the inner
/// store and may not yet reflect queued writes.
#[derive(Debug)]
pub struct QueuedStore {
    inner: Arc<dyn Store>,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<Write>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl QueuedStore {
    /// Starts the drain worker for `inner` with room for `capacity` writes.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(inner: Arc<dyn Store>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<Write>(capacity);

        let drain_store = Arc::clone(&inner);
        let worker = tokio::task::spawn_blocking(move || {
            while let Some(write) = receiver.blocking_recv() {
                let kind = write.kind();
                if let Err(e) = write.apply(drain_store.as_ref()) {
                    warn!(store = drain_store.name(), kind, error = %e, "store write failed");
                }
            }
            debug!(store = drain_store.name(), "store queue drained");
        });

        info!(store = inner.name(), capacity, "store queue started");
        Self {
            inner,
            capacity,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Store> {
        &self.inner
    }

    /// Returns the number of writes waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map_or(0, |sender| self.capacity - sender.capacity())
    }

    /// Returns the number of writes dropped because the queue was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops accepting writes and waits for queued writes to reach the
    /// inner store.
    pub async fn close(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            warn!(store = self.inner.name(), error = %e, "store queue worker failed");
        }
    }

    fn enqueue(&self, write: Write) -> Result<()> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(StoreError::QueueClosed)?;
        sender.try_send(write).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                StoreError::QueueFull(self.capacity)
            }
            TrySendError::Closed(_) => StoreError::QueueClosed,
        })
    }
}

impl Store for QueuedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn insert_ticks(&self, ticks: &[Tick]) -> Result<()> {
        self.enqueue(Write::Ticks(ticks.to_vec()))
    }

    fn insert_ohlcv(&self, candle: &Ohlcv) -> Result<()> {
        self.enqueue(Write::Ohlcv(candle.clone()))
    }

    fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.enqueue(Write::Alert(alert.clone()))
    }

    fn query_ticks(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<Tick>> {
        self.inner.query_ticks(symbol, limit)
    }

    fn query_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Ohlcv>> {
        self.inner.query_ohlcv(symbol, timeframe, limit)
    }

    fn query_alerts(
        &self,
        symbol: Option<&str>,
        severity: Option<AlertSeverity>,
        limit: usize,
    ) -> Result<Vec<Alert>> {
        self.inner.query_alerts(symbol, severity, limit)
    }

    fn counts(&self) -> StoreCounts {
        self.inner.counts()
    }
}
