use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::modules::matching::domain::entities::{BookRecord, SearchQuery, SearchResult};
use crate::modules::matching::domain::repositories::CandidateSource;
use crate::modules::matching::domain::services::{
    author_name_variants, TextNormalizer, TfIdfCorpus, DEFAULT_NGRAM_SIZE,
};
use crate::modules::matching::traits::{
    normalize_weights, option_f64, option_usize, option_weights, BookMatcher, MatcherOptions,
    MatcherStats, MatcherStatsCounter,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::LogContext;

pub const SEMANTIC_MATCHER_NAME: &str = "SemanticMatcher";

/// Minimum characters of title, authors and free text needed for a useful vector
const MIN_DESCRIPTIVE_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatcherConfig {
    pub title_weight: f64,
    pub author_weight: f64,
    pub content_weight: f64,
    pub min_similarity_threshold: f64,
    pub max_results: usize,
    /// Window size for author-name n-grams
    pub ngram_size: usize,
    /// Tokenized records kept before the cache is reset
    pub token_cache_capacity: usize,
}

impl SemanticMatcherConfig {
    pub fn new() -> Self {
        Self {
            title_weight: 0.6,
            author_weight: 0.3,
            content_weight: 0.1,
            min_similarity_threshold: 0.3,
            max_results: 10,
            ngram_size: DEFAULT_NGRAM_SIZE,
            token_cache_capacity: 1000,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.title_weight, self.author_weight, self.content_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("Semantic weights must be non-negative".to_string());
        }
        if weights.iter().sum::<f64>() <= f64::EPSILON {
            return Err("Semantic weights must not all be zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_similarity_threshold) {
            return Err(format!(
                "min_similarity_threshold must be within [0, 1], got {}",
                self.min_similarity_threshold
            ));
        }
        if self.max_results == 0 {
            return Err("max_results must be > 0".to_string());
        }
        if self.ngram_size == 0 {
            return Err("ngram_size must be > 0".to_string());
        }
        if self.token_cache_capacity == 0 {
            return Err("token_cache_capacity must be > 0".to_string());
        }
        Ok(())
    }

    pub fn merged_with(&self, options: &MatcherOptions) -> Result<Self, String> {
        let mut config = self.clone();

        if let Some(weights) = option_weights(options, "weights")? {
            for (field, weight) in weights {
                match field.as_str() {
                    "title" => config.title_weight = weight,
                    "author" | "authors" => config.author_weight = weight,
                    "content" => config.content_weight = weight,
                    other => return Err(format!("unknown semantic weight '{}'", other)),
                }
            }
        }
        if let Some(threshold) = option_f64(options, "min_similarity_threshold")? {
            config.min_similarity_threshold = threshold;
        }
        if let Some(max_results) = option_usize(options, "max_results")? {
            config.max_results = max_results;
        }
        if let Some(ngram_size) = option_usize(options, "ngram_size")? {
            config.ngram_size = ngram_size;
        }
        if let Some(capacity) = option_usize(options, "token_cache_capacity")? {
            config.token_cache_capacity = capacity;
        }

        let mut weights = [config.title_weight, config.author_weight, config.content_weight];
        normalize_weights(&mut weights)?;
        [config.title_weight, config.author_weight, config.content_weight] = weights;

        config.validate()?;
        Ok(config)
    }
}

impl Default for SemanticMatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenized view of a record, cached per record id
#[derive(Debug, Clone)]
struct RecordTokens {
    /// Text the tokens were built from; a mismatch means the record changed
    fingerprint: String,
    title: Vec<String>,
    content: Vec<String>,
    authors: Vec<String>,
}

/// Token-overlap (Jaccard) similarity between two variant strings
fn variant_overlap(a: &str, b: &str) -> f64 {
    let split = |s: &str| -> HashSet<String> {
        s.split(|c: char| c.is_whitespace() || c == ',')
            .map(|t| t.trim_end_matches('.'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    };
    let (ta, tb) = (split(a), split(b));
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}

/// 1.0 on any shared name variant, otherwise the best token overlap
fn author_pair_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.intersection(b).next().is_some() {
        return 1.0;
    }
    a.iter()
        .flat_map(|va| b.iter().map(move |vb| variant_overlap(va, vb)))
        .fold(0.0, f64::max)
}

/// Vector-space matcher over titles, free text and author name variants
///
/// Candidate texts feed a TF-IDF corpus that grows across searches.
pub struct SemanticMatcher {
    source: Arc<dyn CandidateSource>,
    config: RwLock<SemanticMatcherConfig>,
    normalizer: TextNormalizer,
    corpus: RwLock<TfIdfCorpus>,
    token_cache: DashMap<String, RecordTokens>,
    stats: MatcherStatsCounter,
}

impl SemanticMatcher {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            source,
            config: RwLock::new(SemanticMatcherConfig::default()),
            normalizer: TextNormalizer::default_pipeline(),
            corpus: RwLock::new(TfIdfCorpus::new()),
            token_cache: DashMap::new(),
            stats: MatcherStatsCounter::default(),
        }
    }

    pub fn config(&self) -> AppResult<SemanticMatcherConfig> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| AppError::InternalError("semantic config lock poisoned".into()))
    }

    pub fn corpus_size(&self) -> usize {
        self.corpus.read().map(|c| c.document_count()).unwrap_or(0)
    }

    pub fn token_cache_len(&self) -> usize {
        self.token_cache.len()
    }

    fn fingerprint(record: &BookRecord) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}",
            record.full_title(),
            record.description.as_deref().unwrap_or_default(),
            record.authors.join("\u{1f}")
        )
    }

    fn record_tokens(&self, record: &BookRecord, capacity: usize) -> RecordTokens {
        let fingerprint = Self::fingerprint(record);
        if let Some(cached) = self.token_cache.get(&record.id) {
            if cached.fingerprint == fingerprint {
                self.stats.record_cache_hit();
                return cached.clone();
            }
        }

        let title = self.normalizer.tokenize(&record.full_title());
        let mut content = title.clone();
        if let Some(description) = &record.description {
            content.extend(self.normalizer.tokenize(description));
        }
        let tokens = RecordTokens {
            fingerprint,
            title,
            content,
            authors: record.authors.clone(),
        };
        if self.token_cache.len() >= capacity && !self.token_cache.contains_key(&record.id) {
            self.token_cache.clear();
        }
        self.token_cache.insert(record.id.clone(), tokens.clone());
        tokens
    }

    fn author_similarity(
        &self,
        query_authors: &[String],
        record_authors: &[String],
        ngram_size: usize,
    ) -> Option<f64> {
        if query_authors.is_empty() || record_authors.is_empty() {
            return None;
        }
        let candidates: Vec<HashSet<String>> = record_authors
            .iter()
            .map(|a| author_name_variants(a, ngram_size))
            .collect();

        let total: f64 = query_authors
            .iter()
            .map(|author| {
                let variants = author_name_variants(author, ngram_size);
                candidates
                    .iter()
                    .map(|candidate| author_pair_similarity(&variants, candidate))
                    .fold(0.0, f64::max)
            })
            .sum();
        Some(total / query_authors.len() as f64)
    }

    async fn try_search(&self, query: &SearchQuery) -> AppResult<Vec<SearchResult>> {
        let config = self.config()?;
        let candidates = self.source.find_candidates(query).await?;

        let tokenized: Vec<RecordTokens> =
            candidates
            .iter()
            .map(|r| self.record_tokens(r, config.token_cache_capacity))
            .collect();
        {
            let mut corpus = self
                .corpus
                .write()
                .map_err(|_| AppError::InternalError("semantic corpus lock poisoned".into()))?;
            for (record, tokens) in candidates.iter().zip(&tokenized) {
                corpus.add_document(&record.id, &tokens.content);
            }
        }

        let query_title = query
            .title()
            .map(|t| self.normalizer.tokenize(t))
            .unwrap_or_default();
        let query_content = query
            .text_content()
            .map(|t| self.normalizer.tokenize(t))
            .unwrap_or_default();

        let corpus = self
            .corpus
            .read()
            .map_err(|_| AppError::InternalError("semantic corpus lock poisoned".into()))?;

        let mut results = Vec::new();
        for (record, tokens) in candidates.iter().zip(&tokenized) {
            let title = (!query_title.is_empty() && !tokens.title.is_empty())
                .then(|| corpus.similarity(&query_title, &tokens.title));
            let author = self.author_similarity(query.authors(), &tokens.authors, config.ngram_size);
            let content = (!query_content.is_empty() && !tokens.content.is_empty())
                .then(|| corpus.similarity(&query_content, &tokens.content));

            let parts = [
                (title, config.title_weight),
                (author, config.author_weight),
                (content, config.content_weight),
            ];
            let (weighted, used) = parts
                .iter()
                .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
                .fold((0.0, 0.0), |(acc, total), (s, w)| (acc + s, total + w));
            if used <= f64::EPSILON {
                continue;
            }
            let score = (weighted / used).clamp(0.0, 1.0);
            if score < config.min_similarity_threshold {
                continue;
            }

            let mut details = serde_json::Map::new();
            details.insert("title_similarity".into(), json!(title));
            details.insert("author_similarity".into(), json!(author));
            details.insert("content_similarity".into(), json!(content));

            results.push(
                SearchResult::new(score, record.to_metadata(), SEMANTIC_MATCHER_NAME)?
                    .with_details(details),
            );
        }

        results.sort_by(|a, b| b.score().total_cmp(&a.score()));
        results.truncate(config.max_results);
        Ok(results)
    }
}

#[async_trait]
impl BookMatcher for SemanticMatcher {
    fn name(&self) -> &'static str {
        SEMANTIC_MATCHER_NAME
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
                log::warn!("{}: rejected options: {}", SEMANTIC_MATCHER_NAME, reason);
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
                LogContext::error_with_context(&e, SEMANTIC_MATCHER_NAME);
                Vec::new()
            }
        }
    }

    fn is_suitable_for_query(&self, query: &SearchQuery) -> bool {
        query.descriptive_text_len() >= MIN_DESCRIPTIVE_CHARS
    }

    fn capabilities(&self) -> Vec<String> {
        ["semantic_similarity", "tfidf_vectors", "author_name_variants", "content_matching"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn stats(&self) -> MatcherStats {
        self.stats.snapshot()
    }
}
