use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::cache_entry::CacheEntry;
use crate::shared::errors::AppResult;

/// Counters reported by one cache tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub size_bytes: u64,
}

impl TierStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// One storage level of the multi-layer cache
///
/// Every operation takes the tier's single lock, so counters and eviction
/// bookkeeping stay consistent under concurrent callers.
pub trait CacheTier<V>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Entry for `key`, or `None` on miss or expiry (expired entries are removed)
    fn get_entry(&self, key: &str) -> AppResult<Option<CacheEntry<V>>>;

    fn get(&self, key: &str) -> AppResult<Option<V>> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }

    fn put(&self, key: &str, value: V, ttl: Option<Duration>) -> AppResult<()>;

    /// Returns whether an entry was removed
    fn delete(&self, key: &str) -> AppResult<bool>;

    fn clear(&self) -> AppResult<()>;

    fn stats(&self) -> TierStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = TierStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
        assert_eq!(TierStats::default().hit_rate(), 0.0);
    }
}
