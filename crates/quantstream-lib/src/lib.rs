//! Real-time tick analytics engine.
//!
//! This is a facade crate that re-exports functionality from the quantstream
//! workspace crates and wires them together:
//!
//! - [`Config`] - Settings for every component, loadable from JSON
//! - [`Pipeline`] - Buffer, analytics, alerts, candles and storage behind one [`DataRouter`]
//!
//! Ticks enter through [`Pipeline::route`], or through an [`IngestionSession`]
//! driving a [`TickSource`] into [`Pipeline::router`].

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod pipeline;

pub use config::Config;
pub use error::{ConfigError, PipelineError};
pub use pipeline::{FlushReport, Pipeline, PipelineSummary};

// Re-export core types
pub use quantstream_types::*;

pub use quantstream_aggregate::{CandleAggregator, CandleBuilder, CandleConfig, Ohlcv};

pub use quantstream_analytics::{
    AdfResult, AdfTest, AnalyticsConfig, AnalyticsEngine, AnalyticsError, AnalyticsSummary,
    CorrelationCalculator, CorrelationMatrix, CorrelationMethod, CorrelationResult,
    CriticalValues, OutlierLevel, PriceStats, RatioResult, RegressionCalculator,
    RegressionResult, SpreadCalculator, SpreadResult, ZScoreResult, calculate_zscore,
};

pub use quantstream_alerts::{
    AlertCandidate, AlertConfig, AlertEngine, AlertError, AlertRule, LogNotifier, Notifier,
    RuleCondition, RuleId, RuleInput, SeverityPolicy, create_default_rules,
};

pub use quantstream_store::{
    MemoryStore, NdjsonStore, QueuedStore, StorageConfig, Store, StoreBackend, StoreCounts,
    StoreError,
};

pub use quantstream_ingest::{
    BufferConfig, BufferStats, ChannelSource, DataRouter, HandlerError, HandlerId, IngestError,
    IngestionConfig, IngestionSession, NdjsonSource, RouteReport, SessionEnd, SessionMonitor,
    SessionReport, SessionState, SourceError, StopHandle, TickBuffer, TickHandler, TickSource,
    parse_message,
};

/// Prelude module for convenient imports.
///
/// ```
/// use quantstream_lib::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Config, Pipeline};

    pub use quantstream_types::{Alert, AlertKind, AlertSeverity, Tick, Timeframe};

    pub use quantstream_aggregate::Ohlcv;

    pub use quantstream_analytics::{
        AnalyticsEngine, CorrelationMethod, PriceStats, ZScoreResult,
    };

    pub use quantstream_alerts::{AlertEngine, AlertRule, LogNotifier, Notifier};

    pub use quantstream_store::{MemoryStore, Store};

    pub use quantstream_ingest::{
        DataRouter, IngestionSession, NdjsonSource, TickBuffer, TickHandler, TickSource,
    };
}
