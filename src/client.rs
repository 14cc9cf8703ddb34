//! # Cache Client
//!
//! Redis client handle with the fixed serialization policy installed, plus
//! the factory that builds it from an externally supplied connection factory.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::serializer::{SerializationPolicy, TypeTag};

/// Builds configured cache client handles.
///
/// The connection factory (`redis::Client`) is supplied by the caller with
/// host/port/credentials already set; the factory only attaches the managed
/// connection and installs the serialization policy. Any failure during
/// wiring propagates as an error rather than being retried, so a broken
/// configuration fails at startup.
#[derive(Debug, Clone)]
pub struct CacheClientFactory {
    config: CacheConfig,
}

impl CacheClientFactory {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Build a ready client handle from an already-configured connection
    /// factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the managed connection cannot be established.
    pub async fn build(&self, factory: Client) -> Result<CacheClient> {
        let policy = SerializationPolicy::new(self.config.key_prefix.clone());
        let conn = ConnectionManager::new(factory).await?;

        Ok(CacheClient {
            conn,
            policy,
            config: self.config.clone(),
        })
    }
}

/// Cache client handle.
///
/// Cheap to clone; all clones share the underlying managed connection. The
/// handle holds no mutable state after construction and is safe for
/// concurrent use from any number of tasks.
#[derive(Clone)]
pub struct CacheClient {
    conn: ConnectionManager,
    policy: SerializationPolicy,
    config: CacheConfig,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CacheClient {
    /// Get raw connection for advanced operations
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// The serialization policy installed on this handle
    pub fn policy(&self) -> &SerializationPolicy {
        &self.policy
    }

    // =========================================================================
    // SIMPLE KEY/VALUE OPERATIONS (tagged JSON values)
    // =========================================================================

    /// Store a tagged value under a key.
    ///
    /// Applies the configured default TTL if one is set.
    pub async fn set<T: Serialize + TypeTag>(&self, key: &str, value: &T) -> Result<()> {
        match self.config.default_ttl {
            Some(ttl) => self.set_with_ttl(key, value, ttl).await,
            None => {
                let key = self.policy.encode_key(key)?;
                let payload = self.policy.encode_value(value)?;
                let mut conn = self.conn.clone();
                let _: () = conn.set(&key, payload).await?;
                tracing::debug!(%key, tag = T::TAG, "cache set");
                Ok(())
            }
        }
    }

    /// Store a tagged value under a key with an explicit TTL.
    pub async fn set_with_ttl<T: Serialize + TypeTag>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let key = self.policy.encode_key(key)?;
        let payload = self.policy.encode_value(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, payload, ttl.as_secs()).await?;
        tracing::debug!(%key, tag = T::TAG, ttl_secs = ttl.as_secs(), "cache set");
        Ok(())
    }

    /// Get a tagged value by key. `Ok(None)` on cache miss.
    pub async fn get<T: DeserializeOwned + TypeTag>(&self, key: &str) -> Result<Option<T>> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&key).await?;

        match raw {
            Some(raw) => {
                tracing::debug!(%key, "cache hit");
                let value = self.policy.decode_value(&raw)?;
                Ok(Some(value))
            }
            None => {
                tracing::debug!(%key, "cache miss");
                Ok(None)
            }
        }
    }

    /// Delete a key from cache
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(&key).await?;
        Ok(deleted > 0)
    }

    /// Delete multiple keys
    pub async fn delete_many(&self, keys: &[String]) -> Result<i64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = keys
            .iter()
            .map(|k| self.policy.encode_key(k))
            .collect::<Result<_>>()?;
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(keys).await?;
        Ok(deleted)
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(&key).await?;
        Ok(exists)
    }

    /// Set a TTL on an existing key. Returns false if the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let set: bool = conn.expire(&key, ttl.as_secs() as i64).await?;
        Ok(set)
    }

    // =========================================================================
    // PLAIN-TEXT OPERATIONS
    // =========================================================================
    //
    // For string payloads that must be stored as bare text, not wrapped in
    // the tagged envelope.

    /// Store a plain string under a key.
    pub async fn set_text(&self, key: &str, value: &str) -> Result<()> {
        let key = self.policy.encode_key(key)?;
        let payload = self.policy.encode_text(value);
        let mut conn = self.conn.clone();
        let _: () = conn.set(&key, payload).await?;
        tracing::debug!(%key, "cache set (text)");
        Ok(())
    }

    /// Get a plain string by key. `Ok(None)` on cache miss.
    pub async fn get_text(&self, key: &str) -> Result<Option<String>> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(&key).await?;
        Ok(value)
    }

    // =========================================================================
    // HASH (MAP-FIELD) OPERATIONS
    // =========================================================================

    /// Store a tagged value under a hash field.
    pub async fn hset<T: Serialize + TypeTag>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<()> {
        let key = self.policy.encode_key(key)?;
        let field = self.policy.encode_field(field)?;
        let payload = self.policy.encode_value(value)?;
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(&key, &field, payload).await?;
        tracing::debug!(%key, %field, tag = T::TAG, "cache hset");
        Ok(())
    }

    /// Get a tagged value from a hash field. `Ok(None)` on miss.
    pub async fn hget<T: DeserializeOwned + TypeTag>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>> {
        let key = self.policy.encode_key(key)?;
        let field = self.policy.encode_field(field)?;
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(&key, &field).await?;

        match raw {
            Some(raw) => {
                let value = self.policy.decode_value(&raw)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Get all fields of a hash decoded as `T`. Empty map if the key is absent.
    pub async fn hgetall<T: DeserializeOwned + TypeTag>(
        &self,
        key: &str,
    ) -> Result<HashMap<String, T>> {
        let key = self.policy.encode_key(key)?;
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(&key).await?;

        let mut decoded = HashMap::with_capacity(raw.len());
        for (field, payload) in raw {
            decoded.insert(field, self.policy.decode_value(&payload)?);
        }
        Ok(decoded)
    }

    /// Delete a hash field
    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let key = self.policy.encode_key(key)?;
        let field = self.policy.encode_field(field)?;
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.hdel(&key, &field).await?;
        Ok(deleted > 0)
    }

    /// Store a plain string under a hash field.
    pub async fn hset_text(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let key = self.policy.encode_key(key)?;
        let field = self.policy.encode_field(field)?;
        let payload = self.policy.encode_text(value);
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(&key, &field, payload).await?;
        tracing::debug!(%key, %field, "cache hset (text)");
        Ok(())
    }

    /// Get a plain string from a hash field. `Ok(None)` on miss.
    pub async fn hget_text(&self, key: &str, field: &str) -> Result<Option<String>> {
        let key = self.policy.encode_key(key)?;
        let field = self.policy.encode_field(field)?;
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(&key, &field).await?;
        Ok(value)
    }
}

/// Shared cache client wrapper
pub type SharedCacheClient = Arc<CacheClient>;

/// Create a shared cache client
pub fn shared_cache(client: CacheClient) -> SharedCacheClient {
    Arc::new(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_malformed_url() {
        // Connection factory construction validates the URL without any I/O.
        assert!(Client::open("not-a-redis-url").is_err());
        assert!(Client::open("redis://127.0.0.1:6379").is_ok());
    }

    #[test]
    fn test_factory_is_reusable() {
        let factory = CacheClientFactory::new(CacheConfig::default());
        let again = factory.clone();

        assert_eq!(factory.config.url, again.config.url);
        assert_eq!(factory.config.key_prefix, again.config.key_prefix);
    }
}
