//! Component wiring behind a single tick router.

use parking_lot::Mutex;
use quantstream_aggregate::CandleAggregator;
use quantstream_alerts::{AlertEngine, Notifier, create_default_rules};
use quantstream_analytics::{AnalyticsEngine, AnalyticsSummary};
use quantstream_ingest::{BufferStats, DataRouter, HandlerError, RouteReport, TickBuffer, TickHandler};
use quantstream_store::{
    MemoryStore, NdjsonStore, QueuedStore, Store, StoreBackend, StoreCounts, StoreError,
};
use quantstream_types::Tick;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::{Config, ConfigError, PipelineError};

/// Records written by [`Pipeline::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlushReport {
    /// Open candles finalized and handed to the store.
    pub candles: usize,
    /// Pending ticks handed to the store.
    pub ticks: usize,
}

/// Point-in-time view of every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Ticks routed.
    pub ticks_routed: u64,
    /// Handler calls that returned an error.
    pub handler_failures: u64,
    /// Tick history occupancy.
    pub buffer: BufferStats,
    /// Analytics state.
    pub analytics: AnalyticsSummary,
    /// Candles still open.
    pub open_candles: usize,
    /// Alerts fired.
    pub alerts_fired: u64,
    /// Enabled alert rules.
    pub active_rules: usize,
    /// Records held by the store.
    pub store: StoreCounts,
    /// Writes dropped by a full store queue.
    pub dropped_writes: u64,
}

/// Updates analytics, then evaluates alerts against the fresh snapshot.
struct AnalyticsHandler {
    analytics: Arc<AnalyticsEngine>,
    alerts: Arc<AlertEngine>,
}

impl TickHandler for AnalyticsHandler {
    fn name(&self) -> &str {
        "analytics"
    }

    fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
        if let Some(stats) = self.analytics.update(tick) {
            let fired = self.alerts.evaluate_stats(&stats);
            if !fired.is_empty() {
                trace!(symbol = %tick.symbol, count = fired.len(), "alerts fired");
            }
        }
        Ok(())
    }
}

/// Folds ticks into candles and persists finalized ones.
struct CandleHandler {
    candles: Arc<CandleAggregator>,
    store: Arc<dyn Store>,
}

impl TickHandler for CandleHandler {
    fn name(&self) -> &str {
        "candles"
    }

    fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
        let mut first_error = None;
        for candle in self.candles.add_tick(tick) {
            if let Err(e) = self.store.insert_ohlcv(&candle) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Persists ticks in fixed-size batches.
struct TickArchiver {
    store: Arc<dyn Store>,
    batch_size: usize,
    pending: Mutex<Vec<Tick>>,
}

impl TickArchiver {
    fn new(store: Arc<dyn Store>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Mutex::new(Vec::with_capacity(batch_size)),
        }
    }

    fn flush(&self) -> Result<usize, StoreError> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return Ok(0);
        }
        self.store.insert_ticks(&batch)?;
        Ok(batch.len())
    }
}

impl std::fmt::Debug for TickArchiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickArchiver")
            .field("store", &self.store.name())
            .field("batch_size", &self.batch_size)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl TickHandler for TickArchiver {
    fn name(&self) -> &str {
        "tick_archiver"
    }

    fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
        let batch = {
            let mut pending = self.pending.lock();
            pending.push(tick.clone());
            if pending.len() < self.batch_size {
                return Ok(());
            }
            std::mem::replace(&mut *pending, Vec::with_capacity(self.batch_size))
        };
        self.store.insert_ticks(&batch)?;
        Ok(())
    }
}

/// Buffer, analytics, alerts, candles and storage behind one router.
///
/// Handlers run in registration order for every tick:
///
/// 1. tick buffer
/// 2. analytics update, then alert evaluation on the new snapshot
/// 3. candle aggregation, finalized candles to the store
/// 4. tick archiving in batches of `storage.tick_batch_size`
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    router: Arc<DataRouter>,
    buffer: Arc<TickBuffer>,
    analytics: Arc<AnalyticsEngine>,
    candles: Arc<CandleAggregator>,
    alerts: Arc<AlertEngine>,
    store: Arc<dyn Store>,
    queue: Option<Arc<QueuedStore>>,
    archiver: Arc<TickArchiver>,
}

impl Pipeline {
    /// Wires the components around an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(
        config: Config,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn Store>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, notifier, store, None)
    }

    /// Opens the configured storage backend behind a bounded write queue and
    /// wires the components around it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the backend
    /// cannot be opened.
    pub fn open(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self, PipelineError> {
        config.validate()?;
        let storage = &config.storage;
        let backend: Arc<dyn Store> = match storage.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new(storage.memory_capacity)),
            StoreBackend::Ndjson => Arc::new(NdjsonStore::open(
                storage.path.clone(),
                storage.memory_capacity,
            )?),
        };
        let queue = Arc::new(QueuedStore::spawn(backend, storage.queue_capacity));
        let store: Arc<dyn Store> = Arc::clone(&queue) as Arc<dyn Store>;
        Self::build(config, notifier, store, Some(queue)).map_err(PipelineError::from)
    }

    fn build(
        config: Config,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn Store>,
        queue: Option<Arc<QueuedStore>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let buffer = Arc::new(TickBuffer::from_config(&config.buffer));
        let analytics = Arc::new(AnalyticsEngine::new(config.analytics.clone()));
        let candles = Arc::new(CandleAggregator::from_config(&config.candles));
        let alerts = Arc::new(AlertEngine::new(
            config.alerts.clone(),
            notifier,
            Some(Arc::clone(&store)),
        ));
        alerts.add_rules(create_default_rules(&config.symbols, &config.alerts));
        let archiver = Arc::new(TickArchiver::new(
            Arc::clone(&store),
            config.storage.tick_batch_size,
        ));

        let router = Arc::new(DataRouter::new());
        router.register(Arc::clone(&buffer) as Arc<dyn TickHandler>);
        router.register(Arc::new(AnalyticsHandler {
            analytics: Arc::clone(&analytics),
            alerts: Arc::clone(&alerts),
        }));
        router.register(Arc::new(CandleHandler {
            candles: Arc::clone(&candles),
            store: Arc::clone(&store),
        }));
        router.register(Arc::clone(&archiver) as Arc<dyn TickHandler>);

        info!(
            symbols = ?config.symbols,
            store = store.name(),
            queued = queue.is_some(),
            handlers = router.handler_count(),
            "pipeline initialized"
        );

        Ok(Self {
            config,
            router,
            buffer,
            analytics,
            candles,
            alerts,
            store,
            queue,
            archiver,
        })
    }

    /// Routes one tick through every handler.
    pub fn route(&self, tick: &Tick) -> RouteReport {
        self.router.route(tick)
    }

    /// Finalizes open candles and writes pending ticks to the store.
    ///
    /// Store failures are logged; the report counts records the store
    /// accepted.
    pub fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();
        for candle in self.candles.flush() {
            match self.store.insert_ohlcv(&candle) {
                Ok(()) => report.candles += 1,
                Err(e) => warn!(
                    symbol = %candle.symbol,
                    timeframe = %candle.timeframe,
                    error = %e,
                    "failed to persist open candle"
                ),
            }
        }
        match self.archiver.flush() {
            Ok(ticks) => report.ticks = ticks,
            Err(e) => warn!(error = %e, "failed to persist pending ticks"),
        }
        report
    }

    /// Flushes, then waits for queued writes to reach the backend.
    pub async fn shutdown(&self) -> FlushReport {
        let report = self.flush();
        if let Some(queue) = &self.queue {
            queue.close().await;
        }
        info!(
            candles = report.candles,
            ticks = report.ticks,
            "pipeline shut down"
        );
        report
    }

    /// Returns a snapshot of every component.
    #[must_use]
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            ticks_routed: self.router.routed_count(),
            handler_failures: self.router.failure_count(),
            buffer: self.buffer.stats(),
            analytics: self.analytics.get_summary(),
            open_candles: self.candles.open_candle_count(),
            alerts_fired: self.alerts.alert_count(),
            active_rules: self.alerts.rule_count(),
            store: self.store.counts(),
            dropped_writes: self.queue.as_ref().map_or(0, |q| q.dropped_count()),
        }
    }

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the router, for driving an ingestion session.
    #[must_use]
    pub const fn router(&self) -> &Arc<DataRouter> {
        &self.router
    }

    /// Returns the tick history.
    #[must_use]
    pub const fn buffer(&self) -> &Arc<TickBuffer> {
        &self.buffer
    }

    /// Returns the analytics engine.
    #[must_use]
    pub const fn analytics(&self) -> &Arc<AnalyticsEngine> {
        &self.analytics
    }

    /// Returns the candle aggregator.
    #[must_use]
    pub const fn candles(&self) -> &Arc<CandleAggregator> {
        &self.candles
    }

    /// Returns the alert engine.
    #[must_use]
    pub const fn alerts(&self) -> &Arc<AlertEngine> {
        &self.alerts
    }

    /// Returns the store every component writes to.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}
