pub mod disk_cache;
pub mod memory_cache;
pub mod multi_layer_cache;
pub mod search_cache;

pub use disk_cache::DiskCache;
pub use memory_cache::MemoryCache;
pub use multi_layer_cache::{MultiLayerCache, MultiLayerStats};
pub use search_cache::{SearchCache, SearchCacheStats};
