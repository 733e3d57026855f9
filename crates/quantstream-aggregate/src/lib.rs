//! Candle aggregation for the quantstream tick analytics engine.
//!
//! This crate provides tick-to-OHLCV (candlestick) aggregation:
//!
//! - [`Ohlcv`] - Finalized candle
//! - [`CandleBuilder`] - Accumulator for the open bucket of one symbol and timeframe
//! - [`CandleAggregator`] - Thread-safe multi-symbol, multi-timeframe aggregator

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregator;
mod config;
mod ohlcv;

pub use aggregator::{CandleAggregator, CandleBuilder};
pub use config::CandleConfig;
pub use ohlcv::Ohlcv;
