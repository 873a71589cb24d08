use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::modules::matching::domain::entities::{BookRecord, SearchQuery, SearchResult};
use crate::modules::matching::domain::repositories::CandidateSource;
use crate::modules::matching::domain::services::IsbnValidator;
use crate::modules::matching::traits::{
    option_usize, BookMatcher, MatcherOptions, MatcherStats, MatcherStatsCounter,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::LogContext;

pub const ISBN_MATCHER_NAME: &str = "ISBNMatcher";

/// How a looked-up ISBN was obtained, with the confidence it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsbnMatchMethod {
    Direct,
    Converted,
    Repaired,
    ExtractedFromText,
}

impl IsbnMatchMethod {
    pub fn score(&self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Converted => 0.95,
            Self::Repaired => 0.9,
            Self::ExtractedFromText => 0.85,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Converted => "converted",
            Self::Repaired => "repaired",
            Self::ExtractedFromText => "extracted_from_text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsbnMatcherConfig {
    /// Attempt OCR repair when the query ISBN fails validation
    pub enable_repair: bool,
    /// Scan `text_content` for ISBNs
    pub enable_text_extraction: bool,
    pub max_results: usize,
    /// Lookup cache is cleared once it holds this many ISBNs
    pub lookup_cache_capacity: usize,
}

impl IsbnMatcherConfig {
    pub fn new() -> Self {
        Self {
            enable_repair: true,
            enable_text_extraction: true,
            max_results: 10,
            lookup_cache_capacity: 1000,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_results == 0 {
            return Err("max_results must be > 0".to_string());
        }
        if self.lookup_cache_capacity == 0 {
            return Err("lookup_cache_capacity must be > 0".to_string());
        }
        Ok(())
    }

    pub fn merged_with(&self, options: &MatcherOptions) -> Result<Self, String> {
        let mut config = self.clone();
        for (key, target) in [
            ("enable_repair", &mut config.enable_repair),
            ("enable_text_extraction", &mut config.enable_text_extraction),
        ] {
            match options.get(key) {
                None | Some(serde_json::Value::Null) => {}
                Some(value) => {
                    *target = value
                        .as_bool()
                        .ok_or_else(|| format!("option '{}' must be a boolean", key))?
                }
            }
        }
        if let Some(max_results) = option_usize(options, "max_results")? {
            config.max_results = max_results;
        }
        if let Some(capacity) = option_usize(options, "lookup_cache_capacity")? {
            config.lookup_cache_capacity = capacity;
        }
        config.validate()?;
        Ok(config)
    }
}

impl Default for IsbnMatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier-based matcher
///
/// Validates the query ISBN (repairing OCR damage if needed), also tries
/// its other-length form and any ISBNs found in the free text, and looks
/// each one up in the candidate source. Lookups are memoized, including
/// misses.
pub struct IsbnMatcher {
    source: Arc<dyn CandidateSource>,
    config: RwLock<IsbnMatcherConfig>,
    lookup_cache: DashMap<String, Option<BookRecord>>,
    stats: MatcherStatsCounter,
}

impl IsbnMatcher {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            source,
            config: RwLock::new(IsbnMatcherConfig::default()),
            lookup_cache: DashMap::new(),
            stats: MatcherStatsCounter::default(),
        }
    }

    pub fn config(&self) -> AppResult<IsbnMatcherConfig> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| AppError::InternalError("isbn config lock poisoned".into()))
    }

    /// Every ISBN worth looking up for this query, best method first
    pub fn candidate_isbns(
        &self,
        query: &SearchQuery,
        config: &IsbnMatcherConfig,
    ) -> Vec<(String, IsbnMatchMethod)> {
        let mut found: Vec<(String, IsbnMatchMethod)> = Vec::new();
        let mut push = |isbn: String, method: IsbnMatchMethod| {
            if !found.iter().any(|(existing, _)| *existing == isbn) {
                found.push((isbn, method));
            }
        };

        if let Some(raw) = query.isbn() {
            let cleaned = IsbnValidator::clean(raw);
            if IsbnValidator::is_valid_isbn13(&cleaned) {
                let converted = IsbnValidator::convert_isbn13_to_isbn10(&cleaned);
                push(cleaned, IsbnMatchMethod::Direct);
                if let Some(isbn10) = converted {
                    push(isbn10, IsbnMatchMethod::Converted);
                }
            } else if IsbnValidator::is_valid_isbn10(&cleaned) {
                let converted = IsbnValidator::convert_isbn10_to_isbn13(&cleaned);
                push(cleaned, IsbnMatchMethod::Direct);
                if let Some(isbn13) = converted {
                    push(isbn13, IsbnMatchMethod::Converted);
                }
            } else if config.enable_repair {
                let repair = IsbnValidator::fix_corrupted_isbn(raw);
                log::debug!(
                    "{}: repaired '{}' into {:?} (from {} variants)",
                    ISBN_MATCHER_NAME,
                    raw,
                    repair.valid,
                    repair.candidates.len()
                );
                for isbn in repair.valid {
                    push(isbn, IsbnMatchMethod::Repaired);
                }
            }
        }

        if config.enable_text_extraction {
            if let Some(text) = query.text_content() {
                for isbn in IsbnValidator::extract_isbns_from_text(text) {
                    push(isbn, IsbnMatchMethod::ExtractedFromText);
                }
            }
        }

        found
    }

    async fn lookup(&self, isbn: &str, config: &IsbnMatcherConfig) -> AppResult<Option<BookRecord>> {
        if let Some(cached) = self.lookup_cache.get(isbn) {
            self.stats.record_cache_hit();
            return Ok(cached.clone());
        }

        let record = match self.source.find_by_isbn(isbn).await {
            Ok(record) => record,
            Err(AppError::ValidationError(reason)) => {
                log::debug!("{}: source rejected {}: {}", ISBN_MATCHER_NAME, isbn, reason);
                None
            }
            Err(e) => return Err(e),
        };

        if self.lookup_cache.len() >= config.lookup_cache_capacity {
            self.lookup_cache.clear();
        }
        self.lookup_cache.insert(isbn.to_string(), record.clone());
        Ok(record)
    }

    async fn try_search(&self, query: &SearchQuery) -> AppResult<Vec<SearchResult>> {
        let config = self.config()?;
        let isbns = self.candidate_isbns(query, &config);

        // Best-scoring hit per record id
        let mut hits: HashMap<String, (BookRecord, String, IsbnMatchMethod)> = HashMap::new();
        for (isbn, method) in isbns {
            let Some(record) = self.lookup(&isbn, &config).await? else {
                continue;
            };
            let better = hits
                .get(&record.id)
                .map_or(true, |(_, _, existing)| method.score() > existing.score());
            if better {
                hits.insert(record.id.clone(), (record, isbn, method));
            }
        }

        let mut results = hits
            .into_values()
            .map(|(record, isbn, method)| {
                let mut details = serde_json::Map::new();
                details.insert("matched_isbn".into(), json!(isbn));
                details.insert("match_method".into(), json!(method.as_str()));
                SearchResult::new(method.score(), record.to_metadata(), ISBN_MATCHER_NAME)
                    .map(|r| r.with_details(details))
            })
            .collect::<AppResult<Vec<_>>>()?;

        results.sort_by(|a, b| b.score().total_cmp(&a.score()));
        results.truncate(config.max_results);
        Ok(results)
    }

    pub fn lookup_cache_len(&self) -> usize {
        self.lookup_cache.len()
    }
}

#[async_trait]
impl BookMatcher for IsbnMatcher {
    fn name(&self) -> &'static str {
        ISBN_MATCHER_NAME
    }

    fn configure(&self, options: &MatcherOptions) -> bool {
        let Ok(mut config) = self.config.write() else {
            return false;
        };
        match config.merged_with(options) {
            Ok(updated) => {
                *config = updated;
                true
            }
            Err(reason) => {
                log::warn!("{}: rejected options: {}", ISBN_MATCHER_NAME, reason);
                false
            }
        }
    }

    async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        if !self.is_suitable_for_query(query) {
            return Vec::new();
        }
        match self.try_search(query).await {
            Ok(results) => {
                self.stats.record_search(results.len());
                results
            }
            Err(e) => {
                self.stats.record_failure();
                LogContext::error_with_context(&e, ISBN_MATCHER_NAME);
                Vec::new()
            }
        }
    }

    fn is_suitable_for_query(&self, query: &SearchQuery) -> bool {
        if query.isbn().is_some() {
            return true;
        }
        let extraction_enabled = self
            .config
            .read()
            .map(|c| c.enable_text_extraction)
            .unwrap_or(false);
        extraction_enabled
            && query
                .text_content()
                .is_some_and(|text| !IsbnValidator::extract_isbns_from_text(text).is_empty())
    }

    fn capabilities(&self) -> Vec<String> {
        ["isbn_validation", "isbn_repair", "isbn_conversion", "isbn_text_extraction"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn stats(&self) -> MatcherStats {
        self.stats.snapshot()
    }
}
