//! Core error types for gimer-core.
//!
//! One thiserror enum per concern; callers propagate them with `?`. Decode
//! failures of a collection file are absent: the store recovers those to an
//! empty collection instead of surfacing them.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerId;

/// Timer store and persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The per-user data directory could not be resolved or created
    #[error("Failed to access data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Reading or writing the collection file failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory collection could not be encoded
    #[error("Failed to encode timer collection: {0}")]
    Encode(#[from] serde_json::Error),

    /// No record with the given ID
    #[error("Timer not found: {0}")]
    NotFound(TimerId),

    /// Write failure injected or reported by a non-file provider
    #[error("Persistence provider failed: {0}")]
    Provider(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Alarm output errors.
#[derive(Error, Debug)]
pub enum AlarmError {
    /// The output sink could not be engaged
    #[error("Failed to engage alarm output '{output}': {message}")]
    EngageFailed { output: String, message: String },
}

/// Validation errors for user input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Zero or negative duration
    #[error("Please specify a valid duration using --seconds, --minutes, or --hours.")]
    EmptyDuration,

    /// Duration does not fit in the representable range
    #[error("Duration is too large")]
    DurationOverflow,

    /// Selection typed by the user is not a number
    #[error("Invalid input. Please enter a valid number.")]
    InvalidSelection,

    /// Index typed by the user does not map to a timer
    #[error("Timer with index {0} not found.")]
    UnknownIndex(usize),
}
