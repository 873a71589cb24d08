use async_trait::async_trait;

use crate::modules::matching::domain::entities::{BookRecord, SearchQuery};
use crate::shared::errors::AppResult;

/// Repository interface for candidate book records
///
/// Matchers never own their data: they ask a source for plausible
/// candidates and only implement the scoring. This keeps matching logic
/// independent from where records come from (a metadata provider, a
/// local catalogue, a test fixture).
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Return records that might match the (partial) query
    async fn find_candidates(&self, query: &SearchQuery) -> AppResult<Vec<BookRecord>>;

    /// Exact lookup by ISBN (10 or 13 digits, already cleaned)
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<BookRecord>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}
