use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur in the logging library
#[derive(ThisError, Debug)]
pub enum Error {
    /// The log directory was missing and could not be created.
    #[error("failed to create log directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Appending an entry failed; the entry is dropped.
    #[error("failed to write log file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Listing or deleting during retention failed.
    #[error("failed to clean up log files in {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading the size of the current file failed for a reason other than absence.
    #[error("failed to probe size of {}: {source}", .path.display())]
    SizeProbe {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The background worker is no longer running.
    #[error("log worker is not running")]
    Closed,
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// Timestamp formatting failed.
    #[error("Time format error: {0}")]
    Format(#[from] time::error::Format),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
