//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache settings: {0}")]
    InvalidSettings(String),

    #[error("cache connection error: {0}")]
    Connection(#[source] redis::RedisError),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("failed to encode cache value: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode cache value: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The key does not exist (or has expired).
    #[error("cache key not found: {0}")]
    NotFound(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
