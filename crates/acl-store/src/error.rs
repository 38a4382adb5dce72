//! Error types for bucket store operations
//!
//! Backends map their driver errors into [`StoreError`]; the engine
//! propagates them unchanged.

use thiserror::Error;

/// Bucket store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach or open the backend
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read or a batch command failed on the backend
    #[error("Command failed: {0}")]
    Command(String),

    /// Stored data could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for bucket store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Connection(_) => "STORE_CONNECTION",
            StoreError::Command(_) => "STORE_COMMAND",
            StoreError::Serialization(_) => "STORE_SERIALIZATION",
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}
