pub mod cache_config;
pub mod cache_entry;
pub mod cache_tier;

pub use cache_config::{CacheConfig, SearchCacheConfig};
pub use cache_entry::{CacheEntry, EntryMetadata};
pub use cache_tier::{CacheTier, TierStats};
