//! Error types for the task log cache
//!
//! Store failures are wrapped without reinterpretation: a Redis error reaches
//! the caller as the same `redis::RedisError` the client produced.

use thiserror::Error;

/// Errors raised while building or loading a [`crate::TaskLogConfig`]
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A field is missing, empty, or out of bounds
    #[error("TaskLogCache initialization error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Configuration sources could not be read or deserialized
    #[error("TaskLogCache configuration load error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors surfaced by a [`crate::store::KeyValueStore`] backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error reported by the Redis client, passed through unmodified
    #[cfg(feature = "store-redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// Operation against a key holding the wrong kind of value
    #[error("WRONGTYPE operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    /// Failed to establish a connection to the backend
    #[error("Store connection error: {0}")]
    Connection(String),

    /// Expiry too far in the future to represent
    #[error("invalid expire time {seconds} for key '{key}'")]
    InvalidExpireTime { key: String, seconds: i64 },

    /// A batch reply was missing a result the command always produces
    #[error("missing {command} reply for key '{key}'")]
    MissingReply { command: &'static str, key: String },
}

/// Top-level error for task log operations
#[derive(Debug, Error)]
pub enum TaskLogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A structured status could not be serialized
    #[error("Status serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for task log operations
pub type TaskLogResult<T> = Result<T, TaskLogError>;
