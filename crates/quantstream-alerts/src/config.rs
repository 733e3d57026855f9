//! Alert configuration.

use chrono::TimeDelta;
use quantstream_types::{AlertKind, AlertSeverity};
use serde::{Deserialize, Serialize};

/// Severity bands for z-score alerts.
///
/// Values strictly above a band's bound get that band. Other rule kinds are
/// always [`AlertSeverity::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    /// Lower bound for critical.
    pub critical: f64,
    /// Lower bound for high.
    pub high: f64,
    /// Lower bound for medium.
    pub medium: f64,
}

impl SeverityPolicy {
    /// Classifies a triggered value for a rule kind.
    #[must_use]
    pub fn classify(&self, kind: AlertKind, triggered_value: f64) -> AlertSeverity {
        if !kind.is_zscore() {
            return AlertSeverity::Low;
        }
        let value = triggered_value.abs();
        if value > self.critical {
            AlertSeverity::Critical
        } else if value > self.high {
            AlertSeverity::High
        } else if value > self.medium {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            critical: 4.0,
            high: 3.0,
            medium: 2.0,
        }
    }
}

/// Alert engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum seconds between two alerts for the same rule kind and symbol.
    pub cooldown_seconds: u64,
    /// Default z-score threshold.
    pub zscore_threshold: f64,
    /// Default absolute price change threshold, in percent.
    pub price_change_threshold: f64,
    /// Default volume spike multiplier.
    pub volume_spike_multiplier: f64,
    /// Severity bands.
    pub severity: SeverityPolicy,
}

impl AlertConfig {
    /// Longest accepted cooldown: one year.
    pub const MAX_COOLDOWN_SECONDS: u64 = 365 * 24 * 60 * 60;

    /// Returns the cooldown as a duration, saturating at [`TimeDelta::MAX`].
    #[must_use]
    pub fn cooldown(&self) -> TimeDelta {
        i64::try_from(self.cooldown_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 300,
            zscore_threshold: 3.0,
            price_change_threshold: 2.0,
            volume_spike_multiplier: 3.0,
            severity: SeverityPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zscore_severity_bands() {
        let policy = SeverityPolicy::default();
        let kind = AlertKind::ZscoreThreshold;
        assert_eq!(policy.classify(kind, 4.5), AlertSeverity::Critical);
        assert_eq!(policy.classify(kind, 3.5), AlertSeverity::High);
        assert_eq!(policy.classify(kind, 2.5), AlertSeverity::Medium);
        assert_eq!(policy.classify(kind, 1.5), AlertSeverity::Low);
        assert_eq!(policy.classify(kind, -4.5), AlertSeverity::Critical);
        // Bounds are exclusive
        assert_eq!(policy.classify(kind, 4.0), AlertSeverity::High);
    }

    #[test]
    fn test_other_kinds_are_low() {
        let policy = SeverityPolicy::default();
        assert_eq!(policy.classify(AlertKind::PriceChange, 1.0), AlertSeverity::Low);
        assert_eq!(policy.classify(AlertKind::VolumeSpike, 10.0), AlertSeverity::Low);
    }

    #[test]
    fn test_cooldown_saturates() {
        let config = AlertConfig::default();
        assert_eq!(config.cooldown(), TimeDelta::seconds(300));

        let huge = AlertConfig {
            cooldown_seconds: 10_000_000_000_000_000,
            ..AlertConfig::default()
        };
        assert_eq!(huge.cooldown(), TimeDelta::MAX);

        let max = AlertConfig {
            cooldown_seconds: u64::MAX,
            ..AlertConfig::default()
        };
        assert_eq!(max.cooldown(), TimeDelta::MAX);
    }

    #[test]
    fn test_partial_config() {
        let config: AlertConfig =
            serde_json::from_str(r#"{"cooldown_seconds": 60, "severity": {"critical": 5.0}}"#)
                .unwrap();
        assert_eq!(config.cooldown_seconds, 60);
        assert_eq!(config.severity.critical, 5.0);
        assert_eq!(config.severity.high, 3.0);
        assert_eq!(config.zscore_threshold, 3.0);
    }
}
