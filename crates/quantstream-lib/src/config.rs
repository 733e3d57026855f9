//! Aggregated configuration.

use quantstream_aggregate::CandleConfig;
use quantstream_alerts::AlertConfig;
use quantstream_analytics::AnalyticsConfig;
use quantstream_ingest::{BufferConfig, IngestionConfig};
use quantstream_store::StorageConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ConfigError;

/// Settings for every pipeline component.
///
/// Every section is optional in JSON; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbols that get the default alert rules.
    pub symbols: Vec<String>,
    /// Tick history.
    pub buffer: BufferConfig,
    /// Candle timeframes.
    pub candles: CandleConfig,
    /// Rolling analytics.
    pub analytics: AnalyticsConfig,
    /// Alert thresholds, cooldown and severity bands.
    pub alerts: AlertConfig,
    /// Reconnect timing.
    pub ingestion: IngestionConfig,
    /// Storage sink.
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            buffer: BufferConfig::default(),
            candles: CandleConfig::default(),
            analytics: AnalyticsConfig::default(),
            alerts: AlertConfig::default(),
            ingestion: IngestionConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// [`Config::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Uppercases and deduplicates the symbol list, keeping first occurrences.
    pub fn normalize_symbols(&mut self) {
        let mut seen = Vec::with_capacity(self.symbols.len());
        for symbol in self.symbols.drain(..) {
            let symbol = symbol.trim().to_uppercase();
            if !symbol.is_empty() && !seen.contains(&symbol) {
                seen.push(symbol);
            }
        }
        self.symbols = seen;
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.buffer.max_ticks_per_symbol == 0 {
            return invalid("buffer.max_ticks_per_symbol must be positive");
        }
        if self.candles.timeframes.is_empty() {
            return invalid("candles.timeframes must name at least one timeframe");
        }
        if self.analytics.window_size < 2 {
            return invalid("analytics.window_size must be at least 2");
        }
        if !(self.analytics.adf_significance > 0.0 && self.analytics.adf_significance < 1.0) {
            return invalid("analytics.adf_significance must be in (0, 1)");
        }
        if !positive(self.analytics.annualization_periods) {
            return invalid("analytics.annualization_periods must be finite and positive");
        }

        let alerts = &self.alerts;
        for (name, value) in [
            ("alerts.zscore_threshold", alerts.zscore_threshold),
            ("alerts.price_change_threshold", alerts.price_change_threshold),
            ("alerts.volume_spike_multiplier", alerts.volume_spike_multiplier),
            ("alerts.severity.critical", alerts.severity.critical),
            ("alerts.severity.high", alerts.severity.high),
            ("alerts.severity.medium", alerts.severity.medium),
        ] {
            if !positive(value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }

        if alerts.cooldown_seconds > AlertConfig::MAX_COOLDOWN_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "alerts.cooldown_seconds must be at most {}, got {}",
                AlertConfig::MAX_COOLDOWN_SECONDS,
                alerts.cooldown_seconds
            )));
        }

        if self.ingestion.max_reconnect_attempts == 0 {
            return invalid("ingestion.max_reconnect_attempts must be positive");
        }
        if self.ingestion.recv_timeout_ms == 0 {
            return invalid("ingestion.recv_timeout_ms must be positive");
        }
        if self.storage.tick_batch_size == 0 || self.storage.queue_capacity == 0 {
            return invalid("storage.tick_batch_size and storage.queue_capacity must be positive");
        }
        if self.storage.memory_capacity == 0 {
            return invalid("storage.memory_capacity must be positive");
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantstream_store::StoreBackend;
    use quantstream_types::Timeframe;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.analytics.window_size, 100);
        assert_eq!(config.alerts.cooldown_seconds, 300);
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "symbols": ["SOLUSDT"],
                "analytics": {{"window_size": 250}},
                "candles": {{"timeframes": ["1m", "1h"]}},
                "storage": {{"backend": "ndjson", "path": "/tmp/qs"}}
            }}"#
        )
        .unwrap();

        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.symbols, vec!["SOLUSDT"]);
        assert_eq!(config.analytics.window_size, 250);
        assert_eq!(config.analytics.correlation_min_periods, 30);
        assert_eq!(config.candles.timeframes, vec![Timeframe::Minute1, Timeframe::Hour1]);
        assert_eq!(config.storage.backend, StoreBackend::Ndjson);
        assert_eq!(config.buffer.max_ticks_per_symbol, 10_000);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_json_file("/nonexistent/quantstream.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = Config::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.analytics.window_size = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.candles.timeframes.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alerts.zscore_threshold = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.zscore_threshold"));

        let mut config = Config::default();
        config.alerts.cooldown_seconds = 10_000_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.cooldown_seconds"));

        let mut config = Config::default();
        config.storage.tick_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_symbols() {
        let mut config = Config {
            symbols: vec![" btcusdt".into(), "BTCUSDT".into(), "".into(), "ethusdt".into()],
            ..Config::default()
        };
        config.normalize_symbols();
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }
}
