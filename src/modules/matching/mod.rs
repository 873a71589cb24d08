pub mod domain;
pub mod infrastructure;
pub mod traits;

pub use domain::entities::{BookRecord, Metadata, SearchQuery, SearchResult, ORCHESTRATED_ALGORITHM};
pub use domain::repositories::CandidateSource;
pub use domain::services::IsbnValidator;
pub use infrastructure::{
    FuzzyMatcher, InMemoryCandidateSource, IsbnMatcher, SemanticMatcher, FUZZY_MATCHER_NAME,
    ISBN_MATCHER_NAME, SEMANTIC_MATCHER_NAME,
};
pub use traits::{BookMatcher, MatcherOptions, MatcherStats};
