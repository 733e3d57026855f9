//! Alert records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The rule family that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Absolute z-score above a threshold.
    ZscoreThreshold,
    /// Absolute percentage price change above a threshold.
    PriceChange,
    /// Window volume above a multiple of the average volume.
    VolumeSpike,
}

impl AlertKind {
    /// Returns the kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ZscoreThreshold => "zscore_threshold",
            Self::PriceChange => "price_change",
            Self::VolumeSpike => "volume_spike",
        }
    }

    /// Returns true for z-score rules, whose severity scales with the value.
    #[must_use]
    pub const fn is_zscore(&self) -> bool {
        matches!(self, Self::ZscoreThreshold)
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational.
    #[default]
    Low,
    /// Worth a look.
    Medium,
    /// Needs attention.
    High,
    /// Needs attention now.
    Critical,
}

impl AlertSeverity {
    /// Returns the severity as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "info" => Ok(Self::Low),
            "medium" | "warning" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!(
                "invalid severity '{s}', expected one of: low, medium, high, critical"
            )),
        }
    }
}

/// An alert fired by a rule for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Symbol the alert refers to.
    pub symbol: String,
    /// Time the alert fired.
    pub timestamp: DateTime<Utc>,
    /// Rule family that fired.
    #[serde(rename = "alert_type")]
    pub kind: AlertKind,
    /// Human-readable description.
    pub message: String,
    /// Severity classification.
    pub severity: AlertSeverity,
    /// The value that crossed the rule's threshold.
    pub triggered_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("CRITICAL".parse::<AlertSeverity>().unwrap(), AlertSeverity::Critical);
        assert_eq!("warning".parse::<AlertSeverity>().unwrap(), AlertSeverity::Medium);
        assert!("urgent".parse::<AlertSeverity>().is_err());
    }

    #[test]
    fn test_alert_serializes_kind_as_alert_type() {
        let alert = Alert {
            symbol: "BTCUSDT".to_string(),
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            kind: AlertKind::VolumeSpike,
            message: "spike".to_string(),
            severity: AlertSeverity::Low,
            triggered_value: 4.2,
        };
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"alert_type\":\"volume_spike\""));
        assert!(json.contains("\"severity\":\"low\""));
    }
}
