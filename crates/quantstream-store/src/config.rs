//! Storage configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Bounded in-memory store.
    #[default]
    Memory,
    /// Newline-delimited JSON files.
    Ndjson,
}

impl StoreBackend {
    /// Returns the backend as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Ndjson => "ndjson",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(format!(
                "invalid store backend '{s}', expected memory or ndjson"
            )),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to persist to.
    pub backend: StoreBackend,
    /// Output directory for file backends.
    pub path: PathBuf,
    /// Ticks archived per batch.
    pub tick_batch_size: usize,
    /// Pending writes held before new writes are dropped.
    pub queue_capacity: usize,
    /// Records of each kind retained in memory for queries.
    pub memory_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("data"),
            tick_batch_size: 1_000,
            queue_capacity: 10_000,
            memory_capacity: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("NDJSON".parse::<StoreBackend>().unwrap(), StoreBackend::Ndjson);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_partial_config() {
        let config: StorageConfig = serde_json::from_str(r#"{"backend":"ndjson"}"#).unwrap();
        assert_eq!(config.backend, StoreBackend::Ndjson);
        assert_eq!(config.tick_batch_size, 1_000);
        assert_eq!(config.path, PathBuf::from("data"));
    }
}
