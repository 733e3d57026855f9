//! Configuration and pipeline errors.

use quantstream_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`Config`](crate::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file {path}: {source}")]
    ParseJson {
        /// Path to the file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A setting is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while building a [`Pipeline`](crate::Pipeline).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The storage backend could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
}
