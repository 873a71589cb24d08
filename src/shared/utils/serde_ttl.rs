//! Serialization helpers for optional TTL durations.
//!
//! A TTL is written as fractional seconds, or `null` for entries that
//! never expire.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize `Option<Duration>` as seconds (or null).
pub fn serialize<S>(ttl: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match ttl {
        Some(duration) => serializer.serialize_f64(duration.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// Deserialize `Option<Duration>` from seconds (or null).
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|s| {
            Duration::try_from_secs_f64(s)
                .map_err(|e| serde::de::Error::custom(format!("invalid ttl {}: {}", s, e)))
        })
        .transpose()
}
