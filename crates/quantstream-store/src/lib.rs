//! Storage sinks for the quantstream tick analytics engine.
//!
//! This crate provides the append/query contract the pipeline persists to:
//!
//! - [`Store`] - Sink trait for ticks, candles and alerts
//! - [`MemoryStore`] - Bounded in-memory sink
//! - [`NdjsonStore`] - Newline-delimited JSON files with an in-memory index
//! - [`QueuedStore`] - Bounded queue in front of any sink
//! - [`StorageConfig`] - Backend selection and sizing

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod memory;
mod ndjson;
mod queued;
mod store;

pub use config::{StorageConfig, StoreBackend};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use ndjson::NdjsonStore;
pub use queued::QueuedStore;
pub use store::{Store, StoreCounts};
