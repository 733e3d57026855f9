//! Tick ingestion for the quantstream tick analytics engine.
//!
//! - [`TickBuffer`] - Bounded per-symbol tick history
//! - [`DataRouter`] - Fan-out of each tick to registered [`TickHandler`]s
//! - [`TickSource`] - Async source of ticks ([`ChannelSource`], [`NdjsonSource`])
//! - [`IngestionSession`] - Reconnect state machine driving a source into a router

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod buffer;
mod error;
mod router;
mod session;
mod source;

pub use buffer::{BufferConfig, BufferStats, TickBuffer};
pub use error::{IngestError, SourceError};
pub use router::{DataRouter, HandlerError, HandlerId, RouteReport, TickHandler};
pub use session::{
    IngestionConfig, IngestionSession, SessionEnd, SessionMonitor, SessionReport, SessionState,
    StopHandle,
};
pub use source::{ChannelSource, NdjsonSource, TickSource, parse_message};
