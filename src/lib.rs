//! Multi-strategy bibliographic matching with tiered result caching.
//!
//! A `SearchQuery` goes through the `SearchService`, which answers from
//! the `SearchCache` when it can and otherwise asks the
//! `SearchOrchestrator` to run the registered matchers (ISBN, fuzzy,
//! semantic or any custom `BookMatcher`) and combine their results.

pub mod modules;
pub mod shared;

pub use modules::cache::{CacheConfig, MultiLayerCache, SearchCache, SearchCacheConfig};
pub use modules::matching::{
    BookMatcher, BookRecord, CandidateSource, FuzzyMatcher, InMemoryCandidateSource, IsbnMatcher,
    IsbnValidator, MatcherOptions, SearchQuery, SearchResult, SemanticMatcher,
};
pub use modules::search::{
    OrchestratorConfig, SearchOrchestrator, SearchResponse, SearchService, SearchStrategy,
};
pub use shared::{AppError, AppResult, EngineConfig};
