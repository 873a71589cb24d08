use chrono::Utc;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::modules::cache::domain::{CacheEntry, CacheTier, TierStats};
use crate::shared::errors::{AppError, AppResult};

struct MemoryState<V> {
    entries: LruCache<String, CacheEntry<V>>,
    stats: TierStats,
}

impl<V> MemoryState<V> {
    fn forget(&mut self, entry: &CacheEntry<V>) {
        self.stats.size_bytes = self
            .stats
            .size_bytes
            .saturating_sub(entry.metadata.size_bytes);
    }
}

/// Bounded in-process tier with least-recently-used eviction
pub struct MemoryCache<V> {
    state: Mutex<MemoryState<V>>,
}

impl<V> MemoryCache<V> {
    pub fn new(capacity: usize) -> AppResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            AppError::ConfigurationError("memory cache capacity must be > 0".to_string())
        })?;
        Ok(Self {
            state: Mutex::new(MemoryState {
                entries: LruCache::new(capacity),
                stats: TierStats::default(),
            }),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, MemoryState<V>>> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalError("memory cache lock poisoned".to_string()))
    }

    pub fn capacity(&self) -> usize {
        self.lock().map(|s| s.entries.cap().get()).unwrap_or(0)
    }

    /// Whether `key` is present, without touching recency or counters
    pub fn contains(&self, key: &str) -> bool {
        self.lock()
            .map(|s| s.entries.contains(key))
            .unwrap_or(false)
    }
}

impl<V> CacheTier<V> for MemoryCache<V>
where
    V: Clone + Serialize + Send + Sync,
{
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_entry(&self, key: &str) -> AppResult<Option<CacheEntry<V>>> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let now = Utc::now();

        let expired = match state.entries.get_mut(key) {
            None => {
                state.stats.misses += 1;
                return Ok(None);
            }
            Some(entry) if entry.metadata.is_expired_at(now) => true,
            Some(entry) => {
                entry.metadata.touch();
                let found = entry.clone();
                state.stats.hits += 1;
                return Ok(Some(found));
            }
        };

        if expired {
            if let Some(entry) = state.entries.pop(key) {
                state.forget(&entry);
            }
            state.stats.expirations += 1;
            state.stats.misses += 1;
            debug!("memory tier: expired {}", key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: V, ttl: Option<Duration>) -> AppResult<()> {
        let entry = CacheEntry::new(key, value, ttl);
        let mut guard = self.lock()?;
        let state = &mut *guard;

        if let Some(previous) = state.entries.pop(key) {
            state.forget(&previous);
        } else if state.entries.len() >= state.entries.cap().get() {
            if let Some((evicted_key, evicted)) = state.entries.pop_lru() {
                state.forget(&evicted);
                state.stats.evictions += 1;
                debug!("memory tier: evicted {}", evicted_key);
            }
        }

        state.stats.size_bytes += entry.metadata.size_bytes;
        state.entries.put(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> AppResult<bool> {
        let mut state = self.lock()?;
        match state.entries.pop(key) {
            Some(entry) => {
                state.forget(&entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> AppResult<()> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.stats.size_bytes = 0;
        Ok(())
    }

    fn stats(&self) -> TierStats {
        match self.lock() {
            Ok(state) => TierStats {
                entries: state.entries.len(),
                ..state.stats.clone()
            },
            Err(_) => TierStats::default(),
        }
    }
}
