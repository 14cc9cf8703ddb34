//! # Serialization Policy
//!
//! Fixed encoder pairing for the four data channels a key-value cache
//! distinguishes: keys and hash field names are stored as raw UTF-8 text so
//! they stay human-readable in the store; values and hash field values are
//! stored as JSON wrapped in an envelope carrying an explicit type tag that
//! is verified on read-back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Stable discriminant for a storable value shape.
///
/// Every type stored through the tagged channel declares a tag. The tag is
/// embedded in the stored form and checked on decode, so reading a key back
/// as the wrong type fails with [`CacheError::TypeMismatch`] instead of
/// silently producing a wrong value. Tags must be unique across the
/// application's storable types and must not change while tagged data is
/// still in the store.
pub trait TypeTag {
    const TAG: &'static str;
}

/// Stored wire form: `{"type": <tag>, "value": <payload>}`.
#[derive(Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    #[serde(rename = "type")]
    tag: &'static str,
    value: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    tag: String,
    value: serde_json::Value,
}

/// Plain-text key encoder with an optional namespace prefix.
#[derive(Debug, Clone, Default)]
pub struct KeySerializer {
    prefix: String,
}

impl KeySerializer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Encode a simple key. Empty keys are rejected.
    pub fn encode(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("empty key".to_string()));
        }
        Ok(format!("{}{key}", self.prefix))
    }

    /// Encode a hash field name. Same plain-text encoding as simple keys,
    /// without the prefix: the prefix namespaces the hash key itself.
    pub fn encode_field(&self, field: &str) -> Result<String> {
        if field.is_empty() {
            return Err(CacheError::InvalidKey("empty hash field".to_string()));
        }
        Ok(field.to_string())
    }
}

/// Tagged-JSON value encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

impl ValueSerializer {
    /// Encode a value into the tagged envelope.
    pub fn encode<T>(&self, value: &T) -> Result<String>
    where
        T: Serialize + TypeTag,
    {
        let json = serde_json::to_string(&EnvelopeRef {
            tag: T::TAG,
            value,
        })?;
        Ok(json)
    }

    /// Encode a plain string payload. Stored as bare text, never wrapped
    /// in the tagged envelope.
    pub fn encode_text<'a>(&self, value: &'a str) -> &'a str {
        value
    }

    /// Decode a stored envelope back into `T`.
    ///
    /// The stored tag is compared against `T::TAG` before the payload is
    /// touched; a mismatch is a type-resolution failure.
    pub fn decode<T>(&self, raw: &str) -> Result<T>
    where
        T: DeserializeOwned + TypeTag,
    {
        let envelope: Envelope = serde_json::from_str(raw)?;
        if envelope.tag != T::TAG {
            return Err(CacheError::TypeMismatch {
                expected: T::TAG.to_string(),
                found: envelope.tag,
            });
        }
        let value = serde_json::from_value(envelope.value)?;
        Ok(value)
    }
}

/// The fixed encoder pairing installed on every client handle.
///
/// Immutable after construction. Every write and every subsequent read of a
/// given key must go through the same policy, or decoding fails.
#[derive(Debug, Clone)]
pub struct SerializationPolicy {
    keys: KeySerializer,
    values: ValueSerializer,
}

impl SerializationPolicy {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            keys: KeySerializer::new(key_prefix),
            values: ValueSerializer,
        }
    }

    /// Encode a simple key (plain text, prefixed).
    pub fn encode_key(&self, key: &str) -> Result<String> {
        self.keys.encode(key)
    }

    /// Encode a hash field name (plain text, unprefixed).
    pub fn encode_field(&self, field: &str) -> Result<String> {
        self.keys.encode_field(field)
    }

    /// Encode a value or hash field value (tagged JSON).
    pub fn encode_value<T: Serialize + TypeTag>(&self, value: &T) -> Result<String> {
        self.values.encode(value)
    }

    /// Encode a plain-text value or hash field value (bare string).
    pub fn encode_text<'a>(&self, value: &'a str) -> &'a str {
        self.values.encode_text(value)
    }

    /// Decode a value or hash field value (tagged JSON).
    pub fn decode_value<T: DeserializeOwned + TypeTag>(&self, raw: &str) -> Result<T> {
        self.values.decode(raw)
    }
}

impl Default for SerializationPolicy {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    impl TypeTag for User {
        const TAG: &'static str = "User";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        name: String,
        age: u32,
    }

    impl TypeTag for Session {
        const TAG: &'static str = "Session";
    }

    #[test]
    fn test_value_round_trip() {
        let policy = SerializationPolicy::default();
        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        let encoded = policy.encode_value(&user).unwrap();
        let decoded: User = policy.decode_value(&encoded).unwrap();

        assert_eq!(decoded, user);
    }

    #[test]
    fn test_envelope_carries_type_tag() {
        let policy = SerializationPolicy::default();
        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        let encoded = policy.encode_value(&user).unwrap();
        let json: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(json["type"], "User");
        assert_eq!(json["value"]["name"], "Alice");
        assert_eq!(json["value"]["age"], 30);
    }

    #[test]
    fn test_tag_mismatch_is_an_error() {
        let policy = SerializationPolicy::default();
        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        // Session has the same field layout, so only the tag check can
        // prevent decoding into the wrong type.
        let encoded = policy.encode_value(&user).unwrap();
        let err = policy.decode_value::<Session>(&encoded).unwrap_err();

        match err {
            CacheError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "Session");
                assert_eq!(found, "User");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_envelope_is_a_serialization_error() {
        let policy = SerializationPolicy::default();

        let err = policy.decode_value::<User>("not json").unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));

        let err = policy.decode_value::<User>(r#"{"no":"tag"}"#).unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Token(String);

    impl TypeTag for Token {
        const TAG: &'static str = "Token";
    }

    #[test]
    fn test_text_channel_stored_unwrapped() {
        let policy = SerializationPolicy::default();

        // A hash field value like ("session:1", "csrf") <- "abc123" is
        // stored as the bare string.
        assert_eq!(policy.encode_text("abc123"), "abc123");

        // The tagged channel wraps the same payload in an envelope, so the
        // two stored forms must differ.
        let tagged = policy.encode_value(&Token("abc123".to_string())).unwrap();
        assert_ne!(tagged, "abc123");

        let json: serde_json::Value = serde_json::from_str(&tagged).unwrap();
        assert_eq!(json["type"], "Token");
        assert_eq!(json["value"], "abc123");
    }

    #[test]
    fn test_key_prefix() {
        let policy = SerializationPolicy::new("app:");

        assert_eq!(policy.encode_key("user:1").unwrap(), "app:user:1");
        // Field names stay unprefixed
        assert_eq!(policy.encode_field("csrf").unwrap(), "csrf");
    }

    #[test]
    fn test_empty_key_rejected() {
        let policy = SerializationPolicy::default();

        assert!(matches!(
            policy.encode_key(""),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            policy.encode_field(""),
            Err(CacheError::InvalidKey(_))
        ));
    }
}
