use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::utils::serde_ttl;

/// Bookkeeping for one cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub key: String,
    /// Creation time; TTL is measured from here
    pub timestamp: DateTime<Utc>,
    #[serde(with = "serde_ttl")]
    pub ttl: Option<Duration>,
    pub access_count: u64,
    pub last_access: DateTime<Utc>,
    pub size_bytes: u64,
}

impl EntryMetadata {
    pub fn new(key: impl Into<String>, ttl: Option<Duration>, size_bytes: u64) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            timestamp: now,
            ttl,
            access_count: 0,
            last_access: now,
            size_bytes,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_ttl_at(now).is_some_and(|left| left.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, `None` for entries without a TTL
    pub fn remaining_ttl_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let ttl = self.ttl?;
        let elapsed = (now - self.timestamp).to_std().unwrap_or(Duration::ZERO);
        Some(ttl.saturating_sub(elapsed))
    }

    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access = Utc::now();
    }
}

/// A cached value with its metadata
///
/// This is also the on-disk layout of the disk tier:
/// `{"entry": {...metadata...}, "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    #[serde(rename = "entry")]
    pub metadata: EntryMetadata,
    pub value: V,
}

impl<V: Serialize> CacheEntry<V> {
    /// Build an entry, estimating its size from the JSON encoding of the value
    pub fn new(key: impl Into<String>, value: V, ttl: Option<Duration>) -> Self {
        let size_bytes = serde_json::to_vec(&value).map_or(0, |bytes| bytes.len() as u64);
        Self {
            metadata: EntryMetadata::new(key, ttl, size_bytes),
            value,
        }
    }
}
