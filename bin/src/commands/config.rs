//! Config command implementation.

use anyhow::{Context, Result};
use quantstream_lib::Config;

/// Prints the effective configuration as pretty JSON.
pub(crate) fn show_config(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{json}");
    Ok(())
}
