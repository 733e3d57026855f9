//! Rolling-window analytics for the quantstream tick analytics engine.
//!
//! This crate provides the calculators and the engine that orchestrates them:
//!
//! - [`PriceStats`] - Per-symbol rolling price and volume statistics
//! - [`ZScoreResult`] - Z-score of the newest price against its window
//! - [`CorrelationCalculator`] - Pearson and Spearman correlation between symbols
//! - [`RegressionCalculator`] - OLS regression and hedge ratio
//! - [`SpreadCalculator`] - Hedged spread and price ratio z-scores
//! - [`AdfTest`] - Augmented Dickey-Fuller stationarity test
//! - [`AnalyticsEngine`] - Thread-safe orchestrator keyed by symbol
//!
//! Calculators are pure functions over price slices; the engine owns the
//! rolling windows and takes one lock per update so all views agree.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adf;
mod config;
mod correlation;
mod engine;
mod error;
mod math;
mod regression;
mod spread;
mod stats;
mod zscore;

pub use adf::{AdfResult, AdfTest, CriticalValues, mackinnon_critical_values, mackinnon_p_value};
pub use config::AnalyticsConfig;
pub use correlation::{
    CorrelationCalculator, CorrelationMatrix, CorrelationMethod, CorrelationResult,
};
pub use engine::{AnalyticsEngine, AnalyticsSummary};
pub use error::{AnalyticsError, Result};
pub use regression::{RegressionCalculator, RegressionResult};
pub use spread::{RatioResult, SpreadCalculator, SpreadResult};
pub use stats::PriceStats;
pub use zscore::{OutlierLevel, ZScoreResult, calculate_zscore};
