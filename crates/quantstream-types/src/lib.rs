//! Core types for the quantstream tick analytics engine.
//!
//! This crate provides the fundamental data structures used throughout quantstream:
//!
//! - [`Tick`] - A single trade with symbol, timestamp, price and size
//! - [`Timeframe`] - Candle aggregation timeframe
//! - [`RollingWindow`] - Bounded FIFO backing every per-symbol window
//! - [`Alert`] - Severity-classified alert record

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod alert;
mod error;
mod tick;
mod timeframe;
mod window;

pub use alert::{Alert, AlertKind, AlertSeverity};
pub use error::{Result, TickError};
pub use tick::{Tick, parse_timestamp};
pub use timeframe::{Timeframe, TimeframeParseError};
pub use window::RollingWindow;
