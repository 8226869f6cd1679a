//! Error types for the shardfs storage driver.

use thiserror::Error;

/// Failures reported by an [`ObjectStoreClient`](crate::store::ObjectStoreClient).
///
/// Only `NoSuchKey` and `InvalidRange` carry meaning for the driver; everything
/// else is transport noise that is wrapped with the virtual path in context.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such key: {0}")]
    NoSuchKey(String),

    #[error("invalid range for key {key}: offset {offset}")]
    InvalidRange { key: String, offset: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Other(String),
}

/// Driver-level errors surfaced to callers.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error("transport error for {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("walk aborted: {0}")]
    Walk(String),
}

impl DriverError {
    pub fn not_found(path: impl Into<String>) -> Self {
        DriverError::NotFound { path: path.into() }
    }

    /// Map a store failure for `path`, turning `NoSuchKey` into `NotFound`.
    pub fn from_store(path: impl Into<String>, err: StoreError) -> Self {
        match err {
            StoreError::NoSuchKey(_) => DriverError::NotFound { path: path.into() },
            other => DriverError::Transport {
                path: path.into(),
                source: other,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound { .. })
    }
}

impl From<config::ConfigError> for DriverError {
    fn from(err: config::ConfigError) -> Self {
        DriverError::Config(err.to_string())
    }
}

pub type Result<T, E = DriverError> = std::result::Result<T, E>;
