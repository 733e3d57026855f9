//! Alert rules.

use quantstream_analytics::{PriceStats, ZScoreResult};
use quantstream_types::AlertKind;
use serde::{Deserialize, Serialize};

use crate::{AlertConfig, AlertError};

/// Snapshot a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum RuleInput<'a> {
    /// Full statistics snapshot; every rule kind applies.
    Stats(&'a PriceStats),
    /// Z-score only; only z-score rules apply.
    ZScore(&'a ZScoreResult),
}

impl RuleInput<'_> {
    /// Returns the symbol of the snapshot.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Stats(stats) => &stats.symbol,
            Self::ZScore(zscore) => &zscore.symbol,
        }
    }

    fn zscore(&self) -> f64 {
        match self {
            Self::Stats(stats) => ZScoreResult::from_stats(stats).zscore,
            Self::ZScore(zscore) => zscore.zscore,
        }
    }
}

/// Rule predicate and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Fires when `|zscore| > threshold`.
    ZScoreThreshold {
        /// Absolute z-score bound.
        threshold: f64,
    },
    /// Fires when `|price_change_pct| > threshold_pct`.
    PriceChangePercent {
        /// Absolute percentage bound.
        threshold_pct: f64,
    },
    /// Fires when `total_volume > avg_volume * multiplier` with a positive
    /// average.
    VolumeSpike {
        /// Multiple of the average volume.
        multiplier: f64,
    },
}

impl RuleCondition {
    /// Returns the alert kind this condition produces.
    #[must_use]
    pub const fn kind(&self) -> AlertKind {
        match self {
            Self::ZScoreThreshold { .. } => AlertKind::ZscoreThreshold,
            Self::PriceChangePercent { .. } => AlertKind::PriceChange,
            Self::VolumeSpike { .. } => AlertKind::VolumeSpike,
        }
    }
}

/// A fired rule, before cooldown and severity are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCandidate {
    /// Rule kind that fired.
    pub kind: AlertKind,
    /// Symbol the rule watches.
    pub symbol: String,
    /// Human-readable description.
    pub message: String,
    /// Value that crossed the threshold.
    pub triggered_value: f64,
}

/// A threshold rule for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Symbol the rule watches.
    pub symbol: String,
    /// Disabled rules are never evaluated.
    pub enabled: bool,
    /// Predicate and parameters.
    pub condition: RuleCondition,
}

impl AlertRule {
    /// Creates an enabled rule.
    #[must_use]
    pub fn new(symbol: impl Into<String>, condition: RuleCondition) -> Self {
        Self {
            symbol: symbol.into(),
            enabled: true,
            condition,
        }
    }

    /// Creates a z-score threshold rule.
    #[must_use]
    pub fn zscore_threshold(symbol: impl Into<String>, threshold: f64) -> Self {
        Self::new(symbol, RuleCondition::ZScoreThreshold { threshold })
    }

    /// Creates a price change rule.
    #[must_use]
    pub fn price_change(symbol: impl Into<String>, threshold_pct: f64) -> Self {
        Self::new(symbol, RuleCondition::PriceChangePercent { threshold_pct })
    }

    /// Creates a volume spike rule.
    #[must_use]
    pub fn volume_spike(symbol: impl Into<String>, multiplier: f64) -> Self {
        Self::new(symbol, RuleCondition::VolumeSpike { multiplier })
    }

    /// Returns the alert kind this rule produces.
    #[must_use]
    pub const fn kind(&self) -> AlertKind {
        self.condition.kind()
    }

    /// Evaluates the rule against a snapshot.
    ///
    /// Returns `Ok(None)` when the rule does not fire, is disabled, watches a
    /// different symbol, or needs fields the input does not carry.
    ///
    /// # Errors
    ///
    /// Returns an error when an input field the rule reads is not finite.
    pub fn evaluate(&self, input: RuleInput<'_>) -> Result<Option<AlertCandidate>, AlertError> {
        if !self.enabled || input.symbol() != self.symbol {
            return Ok(None);
        }

        match (self.condition, input) {
            (RuleCondition::ZScoreThreshold { threshold }, input) => {
                let z = self.finite("zscore", input.zscore())?;
                Ok((z.abs() > threshold).then(|| {
                    self.candidate(
                        format!("Z-score {z:.2} exceeds threshold {threshold}"),
                        z.abs(),
                    )
                }))
            }
            (RuleCondition::PriceChangePercent { threshold_pct }, RuleInput::Stats(stats)) => {
                let change = self.finite("price_change_pct", stats.price_change_pct)?.abs();
                Ok((change > threshold_pct)
                    .then(|| self.candidate(format!("Price changed by {change:.2}%"), change)))
            }
            (RuleCondition::VolumeSpike { multiplier }, RuleInput::Stats(stats)) => {
                let current = self.finite("total_volume", stats.total_volume)?;
                let average = self.finite("avg_volume", stats.avg_volume)?;
                Ok((average > 0.0 && current > average * multiplier).then(|| {
                    self.candidate(
                        format!("Volume spike: {current:.2} (avg: {average:.2})"),
                        current / average,
                    )
                }))
            }
            (_, RuleInput::ZScore(_)) => Ok(None),
        }
    }

    fn finite(&self, field: &'static str, value: f64) -> Result<f64, AlertError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AlertError::NonFinite {
                symbol: self.symbol.clone(),
                field,
            })
        }
    }

    fn candidate(&self, message: String, triggered_value: f64) -> AlertCandidate {
        AlertCandidate {
            kind: self.kind(),
            symbol: self.symbol.clone(),
            message,
            triggered_value,
        }
    }
}

/// Builds one rule of each kind per symbol from the configured thresholds.
#[must_use]
pub fn create_default_rules<S: AsRef<str>>(symbols: &[S], config: &AlertConfig) -> Vec<AlertRule> {
    symbols
        .iter()
        .flat_map(|symbol| {
            let symbol = symbol.as_ref();
            [
                AlertRule::zscore_threshold(symbol, config.zscore_threshold),
                AlertRule::price_change(symbol, config.price_change_threshold),
                AlertRule::volume_spike(symbol, config.volume_spike_multiplier),
            ]
        })
        .collect()
}
