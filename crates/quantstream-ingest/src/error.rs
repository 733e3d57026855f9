//! Ingestion errors.

use thiserror::Error;

/// Errors raised by a tick source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source could not be connected.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// An established connection was lost.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// A message could not be decoded into a tick.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end an ingestion session.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source failed `attempts` times in a row.
    #[error("Source '{name}' gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Source name.
        name: String,
        /// Consecutive failed attempts.
        attempts: u32,
        /// The final failure.
        last_error: SourceError,
    },
}
