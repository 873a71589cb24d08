pub mod fuzzy_matcher;
pub mod isbn_matcher;
pub mod semantic_matcher;
pub mod sources;

pub use fuzzy_matcher::{FuzzyMatcher, FuzzyMatcherConfig, FUZZY_MATCHER_NAME};
pub use isbn_matcher::{IsbnMatchMethod, IsbnMatcher, IsbnMatcherConfig, ISBN_MATCHER_NAME};
pub use semantic_matcher::{SemanticMatcher, SemanticMatcherConfig, SEMANTIC_MATCHER_NAME};
pub use sources::InMemoryCandidateSource;
