use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{DiskCache, MemoryCache};
use crate::modules::cache::domain::{CacheConfig, CacheTier, TierStats};
use crate::shared::errors::AppResult;
use crate::shared::utils::LogContext;

/// Combined statistics of both tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLayerStats {
    pub memory: TierStats,
    pub disk: Option<TierStats>,
    /// Disk hits copied into memory
    pub promotions: u64,
}

impl MultiLayerStats {
    /// Hit rate as seen by callers: a hit in either tier counts once
    pub fn overall_hit_rate(&self) -> f64 {
        let hits = self.memory.hits + self.disk.as_ref().map_or(0, |d| d.hits);
        let lookups = self.memory.hits + self.memory.misses;
        if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        }
    }
}

/// Memory tier in front of an optional disk tier
///
/// Reads fall through memory to disk and promote disk hits. Writes go to
/// both tiers. Tier failures are logged and never reach the caller.
pub struct MultiLayerCache<V> {
    memory: Box<dyn CacheTier<V>>,
    disk: Option<Box<dyn CacheTier<V>>>,
    default_ttl: Option<Duration>,
    promotions: AtomicU64,
}

impl<V> MultiLayerCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        memory: Box<dyn CacheTier<V>>,
        disk: Option<Box<dyn CacheTier<V>>>,
        default_ttl: Option<Duration>,
    ) -> Self {
        Self {
            memory,
            disk,
            default_ttl,
            promotions: AtomicU64::new(0),
        }
    }

    /// Build both tiers from configuration
    ///
    /// A disk tier that cannot be opened is logged and skipped.
    pub fn from_config(config: &CacheConfig) -> AppResult<Self> {
        config.validate()?;
        let memory: Box<dyn CacheTier<V>> = Box::new(MemoryCache::new(config.memory_capacity)?);

        let disk = match &config.disk_dir {
            Some(dir) => match DiskCache::<V>::open(dir, config.disk_max_bytes) {
                Ok(disk) => Some(Box::new(disk) as Box<dyn CacheTier<V>>),
                Err(e) => {
                    LogContext::error_with_context(&e, "Opening disk cache tier");
                    None
                }
            },
            None => None,
        };

        Ok(Self::new(memory, disk, config.default_ttl))
    }

    pub fn get(&self, key: &str) -> Option<V> {
        match self.memory.get_entry(key) {
            Ok(Some(entry)) => {
                LogContext::cache_operation(self.memory.name(), "get", key, Some(true));
                return Some(entry.value);
            }
            Ok(None) => {}
            Err(e) => warn!("memory tier get failed for {}: {}", key, e),
        }

        let disk = self.disk.as_ref()?;
        match disk.get_entry(key) {
            Ok(Some(entry)) => {
                LogContext::cache_operation(disk.name(), "get", key, Some(true));
                // Keep the original expiry when promoting
                let remaining = entry.metadata.remaining_ttl_at(Utc::now());
                match self.memory.put(key, entry.value.clone(), remaining) {
                    Ok(()) => {
                        self.promotions.fetch_add(1, Ordering::Relaxed);
                        debug!("promoted {} into memory tier", key);
                    }
                    Err(e) => warn!("promotion of {} failed: {}", key, e),
                }
                Some(entry.value)
            }
            Ok(None) => {
                LogContext::cache_operation(disk.name(), "get", key, Some(false));
                None
            }
            Err(e) => {
                warn!("disk tier get failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store with the configured default TTL
    pub fn put(&self, key: &str, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    pub fn put_with_ttl(&self, key: &str, value: V, ttl: Option<Duration>) {
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.put(key, value.clone(), ttl) {
                warn!("disk tier put failed for {}: {}", key, e);
            }
        }
        if let Err(e) = self.memory.put(key, value, ttl) {
            warn!("memory tier put failed for {}: {}", key, e);
        }
        LogContext::cache_operation("multi", "put", key, None);
    }

    /// Returns whether any tier held the key
    pub fn delete(&self, key: &str) -> bool {
        let mut removed = match self.memory.delete(key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("memory tier delete failed for {}: {}", key, e);
                false
            }
        };
        if let Some(disk) = &self.disk {
            match disk.delete(key) {
                Ok(r) => removed |= r,
                Err(e) => warn!("disk tier delete failed for {}: {}", key, e),
            }
        }
        removed
    }

    pub fn clear(&self) {
        if let Err(e) = self.memory.clear() {
            warn!("memory tier clear failed: {}", e);
        }
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.clear() {
                warn!("disk tier clear failed: {}", e);
            }
        }
    }

    pub fn has_disk_tier(&self) -> bool {
        self.disk.is_some()
    }

    pub fn stats(&self) -> MultiLayerStats {
        MultiLayerStats {
            memory: self.memory.stats(),
            disk: self.disk.as_ref().map(|d| d.stats()),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }
}
