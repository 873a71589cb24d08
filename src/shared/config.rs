use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::modules::cache::{CacheConfig, SearchCacheConfig};
use crate::modules::search::OrchestratorConfig;
use crate::shared::errors::{AppError, AppResult};

const ENV_PREFIX: &str = "BOOKMATCH_";

/// Top-level engine configuration
///
/// Groups the settings of every tunable component so an embedding
/// application can build the whole matching stack from one place.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub search_cache: SearchCacheConfig,
    pub orchestrator: OrchestratorConfig,
}

impl EngineConfig {
    /// Load configuration from the environment (and `.env` if present)
    ///
    /// Unset variables keep their defaults; set-but-unparsable ones are errors.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(dir) = read_var("CACHE_DIR") {
            config.cache.disk_dir = Some(PathBuf::from(dir));
        }
        if let Some(capacity) = parse_var::<usize>("MEMORY_CAPACITY")? {
            config.cache.memory_capacity = capacity;
        }
        if let Some(max_bytes) = parse_var::<u64>("DISK_MAX_BYTES")? {
            config.cache.disk_max_bytes = max_bytes;
        }
        if let Some(secs) = parse_var::<u64>("DEFAULT_TTL_SECS")? {
            // 0 disables expiry for generic entries
            config.cache.default_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64>("SEARCH_TTL_SECS")? {
            config.search_cache.result_ttl = Duration::from_secs(secs);
        }
        if let Some(workers) = parse_var::<usize>("MAX_WORKERS")? {
            config.orchestrator.max_workers = workers;
        }
        if let Some(secs) = parse_var::<u64>("TASK_TIMEOUT_SECS")? {
            config.orchestrator.task_timeout = Duration::from_secs(secs);
        }
        if let Some(max_results) = parse_var::<usize>("MAX_RESULTS")? {
            config.orchestrator.max_results = max_results;
        }

        config.validate()?;
        log::debug!("Engine configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Validates every nested configuration
    pub fn validate(&self) -> AppResult<()> {
        self.cache.validate()?;
        self.search_cache.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> AppResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match read_var(name) {
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            AppError::ConfigurationError(format!("{}{} = '{}': {}", ENV_PREFIX, name, raw, e))
        }),
        None => Ok(None),
    }
}
