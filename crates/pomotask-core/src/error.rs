//! Core error types for pomotask-core.
//!
//! Engine-level failures (validation, duplicate names) are returned to the
//! immediate caller. Persistence failures stay at the I/O boundary and never
//! reach the cycle controller or the ledger.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotask-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A task with the same name already exists in the project
    #[error("A task named '{name}' already exists")]
    DuplicateName { name: String },

    /// No task with the given name
    #[error("No task named '{name}'")]
    NotFound { name: String },

    /// The cycle controller has no task selected
    #[error("No task selected")]
    NoTaskSelected,

    /// A phase is still running, or there is no finished phase to settle
    #[error("Phase state conflict: {0}")]
    PhaseState(&'static str),

    /// Project file errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Validation errors, rejected at the call boundary and never clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A phase duration must be at least one minute
    #[error("Invalid duration for '{field}': {value} (must be at least 1 minute)")]
    InvalidDuration { field: &'static str, value: u32 },

    /// Fast-forward asked for more time than the clock has left
    #[error(
        "Cannot fast-forward {minutes}m {seconds}s: only {minutes_remaining}m {seconds_remaining}s remaining"
    )]
    FastForwardExceedsRemaining {
        minutes: u32,
        seconds: u32,
        minutes_remaining: u32,
        seconds_remaining: u32,
    },

    /// Task names must be non-empty
    #[error("Task name must not be empty")]
    EmptyName,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Project file errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The file could not be read
    #[error("Unable to read from file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written
    #[error("Unable to write to file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents are not a valid project
    #[error("Malformed project file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// The data directory could not be located or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
