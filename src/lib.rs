//! # Typed Cache Library
//!
//! Redis cache client with a fixed serialization policy, built once at
//! startup and shared across the application.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CacheClientFactory                       │
//! │        (attaches connection, installs serialization)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheClient                            │
//! │   keys / hash fields: plain UTF-8 text (optional prefix)     │
//! │   values / hash values: tagged JSON envelope                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Redis                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys stay human-readable in the store; values carry an explicit type tag
//! so reading a key back as the wrong type fails with a type-resolution
//! error instead of silently producing a wrong value.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use typed_cache::{connect, CacheConfig, TypeTag};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User { name: String, age: u32 }
//!
//! impl TypeTag for User {
//!     const TAG: &'static str = "User";
//! }
//!
//! // Build the handle once at startup, then clone it wherever cache
//! // access is needed.
//! let cache = connect(CacheConfig::from_env()).await?;
//!
//! cache.set("user:1", &User { name: "Alice".into(), age: 30 }).await?;
//! let user: Option<User> = cache.get("user:1").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod serializer;

// Re-export commonly used types
pub use client::{shared_cache, CacheClient, CacheClientFactory, SharedCacheClient};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use serializer::{KeySerializer, SerializationPolicy, TypeTag, ValueSerializer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open a connection factory for `config.url` and build a ready cache
/// client handle from it.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the connection cannot be
/// established.
pub async fn connect(config: CacheConfig) -> Result<CacheClient> {
    let factory = redis::Client::open(config.url.as_str())?;
    CacheClientFactory::new(config).build(factory).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let config = CacheConfig {
            url: "not-a-redis-url".to_string(),
            ..CacheConfig::default()
        };

        let err = connect(config).await.unwrap_err();
        assert!(matches!(err, CacheError::Redis(_)));
    }
}
