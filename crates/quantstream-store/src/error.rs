//! Storage errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or querying records.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create the storage directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to open or append to a record file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to serialize a record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The queue drain task has stopped.
    #[error("Store queue is closed")]
    QueueClosed,

    /// The queue is at capacity and the record was dropped.
    #[error("Store queue is full (capacity {0})")]
    QueueFull(usize),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
