pub mod book_record;
pub mod search_query;
pub mod search_result;

pub use book_record::BookRecord;
pub use search_query::SearchQuery;
pub use search_result::{Metadata, SearchResult, ORCHESTRATED_ALGORITHM};
