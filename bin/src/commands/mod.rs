//! CLI command implementations.

pub(crate) mod config;
pub(crate) mod run;

use crate::ConfigOverrides;
use anyhow::{Context, Result};
use quantstream_lib::Config;

/// Loads the configuration file, if any, and applies command-line overrides.
pub(crate) fn load_config(overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(symbols) = &overrides.symbols {
        config.symbols.clone_from(symbols);
    }
    config.normalize_symbols();
    if let Some(timeframes) = &overrides.timeframes {
        config.candles.timeframes.clone_from(timeframes);
    }
    if let Some(window_size) = overrides.window_size {
        config.analytics.window_size = window_size;
    }
    if let Some(cooldown) = overrides.cooldown {
        config.alerts.cooldown_seconds = cooldown;
    }
    if let Some(backend) = overrides.store {
        config.storage.backend = backend;
    }
    if let Some(dir) = &overrides.output_dir {
        config.storage.path.clone_from(dir);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
