//! Core error types for pomodorino-core.
//!
//! Defines the error hierarchy used across the library. Storage and
//! notification failures stay in their own enums so callers can keep the
//! two concerns apart: storage errors fall back to defaults, notification
//! errors are reported and dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for hosts driving the library.
///
/// Notification errors are absent on purpose: they never cross the
/// dispatcher boundary.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Platform data directory could not be determined
    #[error("Cannot determine data directory")]
    NoDataDir,
}

/// Notification channel errors.
///
/// Never propagate past the dispatcher boundary -- they are logged and,
/// depending on the path, surfaced as a toast.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Remote endpoint answered with a non-success status
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Request never reached the endpoint (DNS, refused, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Audio device or playback failure
    #[error("Audio error: {0}")]
    Audio(String),

    /// Desktop notification delivery failure
    #[error("Desktop notification error: {0}")]
    Desktop(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Network(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
