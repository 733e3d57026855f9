//! Alert engine for the quantstream tick analytics engine.
//!
//! - [`AlertRule`] - Z-score, price change and volume spike rules
//! - [`AlertEngine`] - Evaluates rules with a per-rule cooldown
//! - [`Notifier`] / [`LogNotifier`] - Alert delivery
//! - [`AlertConfig`] / [`SeverityPolicy`] - Thresholds and severity bands

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantstream/quantstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod engine;
mod error;
mod notifier;
mod rules;

pub use config::{AlertConfig, SeverityPolicy};
pub use engine::{AlertEngine, RuleId};
pub use error::AlertError;
pub use notifier::{LogNotifier, Notifier};
pub use rules::{AlertCandidate, AlertRule, RuleCondition, RuleInput, create_default_rules};
