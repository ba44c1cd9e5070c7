//! Core error types for Mindscope.
//!
//! The pipeline itself never fails: upstream errors are absorbed into the
//! fallback snapshot. Errors surface only from the explicit "try" entry
//! point, from exporting and from logging setup.

use mindscope_feeds::FeedError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Upstream fetch failed: {0}")]
    Feed(#[from] FeedError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),
}

/// Errors that occur while exporting a snapshot.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The snapshot could not be serialized to JSON.
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A CSV record could not be written.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The export file could not be written.
    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while installing the log subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// A global subscriber or logger is already installed.
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}
