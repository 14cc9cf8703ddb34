//! Cache layer error types

use thiserror::Error;

/// Cache layer errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Type tag mismatch: stored value is tagged `{found}`, requested `{expected}`")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
