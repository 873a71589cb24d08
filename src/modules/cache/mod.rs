pub mod domain;
pub mod infrastructure;

pub use domain::{CacheConfig, CacheEntry, CacheTier, EntryMetadata, SearchCacheConfig, TierStats};
pub use infrastructure::{
    DiskCache, MemoryCache, MultiLayerCache, MultiLayerStats, SearchCache, SearchCacheStats,
};
