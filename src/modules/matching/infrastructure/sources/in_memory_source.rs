use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::modules::matching::domain::entities::{BookRecord, SearchQuery};
use crate::modules::matching::domain::repositories::CandidateSource;
use crate::modules::matching::domain::services::IsbnValidator;
use crate::shared::errors::{AppError, AppResult};

#[derive(Default)]
struct Catalogue {
    records: Vec<BookRecord>,
    by_isbn13: HashMap<String, usize>,
}

/// Candidate source over records supplied by the caller
///
/// `find_candidates` hands back the whole catalogue and leaves scoring to
/// the matchers. ISBN lookups go through an ISBN-13 index, so ISBN-10 and
/// ISBN-13 forms of the same book resolve to one record.
#[derive(Default)]
pub struct InMemoryCandidateSource {
    catalogue: RwLock<Catalogue>,
}

impl InMemoryCandidateSource {
    pub fn new(records: impl IntoIterator<Item = BookRecord>) -> Self {
        let source = Self::default();
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Add or replace (by id) a record
    pub fn insert(&self, record: BookRecord) {
        let Ok(mut catalogue) = self.catalogue.write() else {
            log::error!("Candidate catalogue lock poisoned, dropping record {}", record.id);
            return;
        };

        let index = match catalogue.records.iter().position(|r| r.id == record.id) {
            Some(existing) => {
                catalogue.by_isbn13.retain(|_, idx| *idx != existing);
                catalogue.records[existing] = record;
                existing
            }
            None => {
                catalogue.records.push(record);
                catalogue.records.len() - 1
            }
        };

        let keys: Vec<String> = catalogue.records[index]
            .isbns()
            .into_iter()
            .filter_map(IsbnValidator::normalize_to_isbn13)
            .collect();
        for key in keys {
            catalogue.by_isbn13.insert(key, index);
        }
    }

    pub fn len(&self) -> usize {
        self.catalogue.read().map(|c| c.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    async fn find_candidates(&self, query: &SearchQuery) -> AppResult<Vec<BookRecord>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let catalogue = self
            .catalogue
            .read()
            .map_err(|_| AppError::InternalError("candidate catalogue lock poisoned".into()))?;
        Ok(catalogue.records.clone())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<BookRecord>> {
        let Some(key) = IsbnValidator::normalize_to_isbn13(isbn) else {
            return Err(AppError::ValidationError(format!("not a valid ISBN: {}", isbn)));
        };
        let catalogue = self
            .catalogue
            .read()
            .map_err(|_| AppError::InternalError("candidate catalogue lock poisoned".into()))?;
        Ok(catalogue
            .by_isbn13
            .get(&key)
            .and_then(|&idx| catalogue.records.get(idx))
            .cloned())
    }

    fn name(&self) -> &'static str {
        "InMemory"
    }
}
