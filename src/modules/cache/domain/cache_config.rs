use std::path::PathBuf;
use std::time::Duration;

use crate::shared::errors::{AppError, AppResult};

/// Settings for the generic two-tier cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory of the disk tier; `None` runs memory-only
    pub disk_dir: Option<PathBuf>,
    /// Maximum entries held by the memory tier
    pub memory_capacity: usize,
    /// Size budget of the disk tier in bytes
    pub disk_max_bytes: u64,
    /// TTL applied by `put`; `None` means entries never expire
    pub default_ttl: Option<Duration>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self {
            disk_dir: None,
            memory_capacity: 1000,
            disk_max_bytes: 100 * 1024 * 1024,
            default_ttl: Some(Duration::from_secs(60 * 60)),
        }
    }

    pub fn with_disk_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.disk_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.memory_capacity == 0 {
            return Err(AppError::ConfigurationError(
                "memory_capacity must be > 0".to_string(),
            ));
        }
        if self.disk_dir.is_some() && self.disk_max_bytes == 0 {
            return Err(AppError::ConfigurationError(
                "disk_max_bytes must be > 0 when a disk tier is configured".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings specific to caching search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCacheConfig {
    /// Search results go stale faster than generic entries
    pub result_ttl: Duration,
    /// Only the top results of each query are stored
    pub max_cached_results: usize,
}

impl SearchCacheConfig {
    pub fn new() -> Self {
        Self {
            result_ttl: Duration::from_secs(30 * 60),
            max_cached_results: 20,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.result_ttl.is_zero() {
            return Err(AppError::ConfigurationError(
                "result_ttl must be > 0".to_string(),
            ));
        }
        if self.max_cached_results == 0 {
            return Err(AppError::ConfigurationError(
                "max_cached_results must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}
