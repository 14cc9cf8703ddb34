//! # Cache Configuration
//!
//! Environment-based configuration for the cache client.

use std::env;
use std::time::Duration;

/// Redis cache client configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection pool size hint. The managed connection multiplexes a
    /// single link and does not consume this; it is advisory for
    /// deployments that front the client with their own pool.
    pub pool_size: usize,

    /// Prefix prepended to every key for namespacing
    pub key_prefix: String,

    /// TTL applied by `set` when no explicit TTL is given; `None` means no expiry
    pub default_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 10,
            key_prefix: String::new(),
            default_ttl: None,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            pool_size: env_parsed("REDIS_POOL_SIZE").unwrap_or(10),

            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or_default(),

            default_ttl: env_parsed("CACHE_DEFAULT_TTL_SECS").map(Duration::from_secs),
        }
    }
}

/// Read and parse an environment variable. An unset variable is `None`; a
/// set but unparsable value is logged and also treated as `None` so the
/// caller's default applies.
fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%name, %raw, "unparsable environment value, using default");
            None
        }
    }
}
