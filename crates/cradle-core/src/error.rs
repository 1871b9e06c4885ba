//! Core error types for cradle-core.
//!
//! One umbrella [`CoreError`] plus per-subsystem enums, all built on
//! thiserror. Sync failures never propagate into the logging path: a feed
//! or dose can always be recorded locally even when every remote call fails.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cradle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Daily log store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local persistence cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Daily log store errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Child index outside the fixed two-profile range
    #[error("Child index {0} out of range (tracker holds exactly 2 children)")]
    ChildIndex(usize),

    /// No live event carries the given timestamp
    #[error("No event with timestamp {0} in the live day")]
    EventNotFound(i64),

    /// Invalid wall-clock components for a reschedule
    #[error("Invalid time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

/// Local persistence cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to write the mirror file
    #[error("Failed to write cache at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the state document
    #[error("Failed to serialize state document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Remote sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No remote datastore configured; the session is local-only
    #[error("Remote datastore not configured")]
    NotConfigured,

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote datastore rejected a request
    #[error("Remote datastore error: {0}")]
    RemoteApi(String),

    /// Malformed endpoint configuration
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Serialization error while building a payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (device id, queue files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
