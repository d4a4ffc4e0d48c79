//! Error types for the process log writer

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for log writer operations.
///
/// File-system failures carry the path they concern so the caller can tell a
/// setup failure (directory) from an open failure (file) from a write failure.
/// None of them leave registry state behind for the failing routing key.
#[derive(Error, Debug)]
pub enum LogError {
    /// Base or process directory could not be created
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Log file could not be opened for append
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Size probe of an existing part failed at first open
    #[error("failed to stat log file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Append to an open handle failed
    #[error("failed to write to log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flushing an open handle failed
    #[error("failed to flush log file {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown level name
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// Unknown output format name
    #[error("invalid log format: {0}")]
    InvalidFormat(String),

    /// Configuration value could not be interpreted
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The default instance was used before `init_default`
    #[error("default logger not initialized; call init_default first")]
    NotInitialized,
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;
