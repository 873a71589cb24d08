use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, RwLock};

use crate::modules::matching::domain::entities::{BookRecord, SearchQuery, SearchResult};
use crate::modules::matching::domain::repositories::CandidateSource;
use crate::modules::matching::domain::services::{
    HybridStrategy, JaroWinklerStrategy, SimilarityStrategy, TextNormalizer,
};
use crate::modules::matching::traits::{
    normalize_weights, option_f64, option_usize, option_weights, BookMatcher, MatcherOptions,
    MatcherStats, MatcherStatsCounter,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::LogContext;

pub const FUZZY_MATCHER_NAME: &str = "FuzzyMatcher";

/// Year difference at which year similarity reaches zero
const YEAR_SPAN: f64 = 10.0;

/// Configuration for the fuzzy matcher
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatcherConfig {
    pub title_weight: f64,
    pub author_weight: f64,
    pub publisher_weight: f64,
    pub year_weight: f64,
    /// Candidates scoring below this are dropped
    pub min_similarity_threshold: f64,
    pub max_results: usize,
}

impl FuzzyMatcherConfig {
    pub fn new() -> Self {
        Self {
            title_weight: 0.5,
            author_weight: 0.3,
            publisher_weight: 0.1,
            year_weight: 0.1,
            min_similarity_threshold: 0.8,
            max_results: 10,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            self.title_weight,
            self.author_weight,
            self.publisher_weight,
            self.year_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("Fuzzy weights must be non-negative".to_string());
        }
        if weights.iter().sum::<f64>() <= f64::EPSILON {
            return Err("Fuzzy weights must not all be zero".to_string());
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
        Ok(())
    }

    /// Overlay options on this config, normalizing weights to sum to 1.0
    pub fn merged_with(&self, options: &MatcherOptions) -> Result<Self, String> {
        let mut config = self.clone();

        if let Some(weights) = option_weights(options, "weights")? {
            for (field, weight) in weights {
                match field.as_str() {
                    "title" => config.title_weight = weight,
                    "author" | "authors" => config.author_weight = weight,
                    "publisher" => config.publisher_weight = weight,
                    "year" => config.year_weight = weight,
                    other => return Err(format!("unknown fuzzy weight '{}'", other)),
                }
            }
        }
        if let Some(threshold) = option_f64(options, "min_similarity_threshold")? {
            config.min_similarity_threshold = threshold;
        }
        if let Some(max_results) = option_usize(options, "max_results")? {
            config.max_results = max_results;
        }

        let mut weights = [
            config.title_weight,
            config.author_weight,
            config.publisher_weight,
            config.year_weight,
        ];
        normalize_weights(&mut weights)?;
        [
            config.title_weight,
            config.author_weight,
            config.publisher_weight,
            config.year_weight,
        ] = weights;

        config.validate()?;
        Ok(config)
    }
}

impl Default for FuzzyMatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-field similarities of one candidate
#[derive(Debug, Default)]
struct FieldScores {
    title: Option<f64>,
    author: Option<f64>,
    publisher: Option<f64>,
    year: Option<f64>,
}

impl FieldScores {
    /// Weighted average over the fields present on both sides
    fn combine(&self, config: &FuzzyMatcherConfig) -> Option<f64> {
        let parts = [
            (self.title, config.title_weight),
            (self.author, config.author_weight),
            (self.publisher, config.publisher_weight),
            (self.year, config.year_weight),
        ];

        let (weighted, used) = parts
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
            .fold((0.0, 0.0), |(acc, total), (s, w)| (acc + s, total + w));

        (used > f64::EPSILON).then(|| (weighted / used).clamp(0.0, 1.0))
    }
}

/// Character-level matcher for typo-laden titles and names
///
/// Titles are compared with a Jaro-Winkler/Levenshtein hybrid; authors and
/// publishers with Jaro-Winkler alone.
pub struct FuzzyMatcher {
    source: Arc<dyn CandidateSource>,
    config: RwLock<FuzzyMatcherConfig>,
    normalizer: TextNormalizer,
    title_strategy: HybridStrategy,
    name_strategy: JaroWinklerStrategy,
    stats: MatcherStatsCounter,
}

impl FuzzyMatcher {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            source,
            config: RwLock::new(FuzzyMatcherConfig::default()),
            normalizer: TextNormalizer::comparison_pipeline(),
            title_strategy: HybridStrategy::default_hybrid(),
            name_strategy: JaroWinklerStrategy::default(),
            stats: MatcherStatsCounter::default(),
        }
    }

    pub fn with_config(source: Arc<dyn CandidateSource>, config: FuzzyMatcherConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let matcher = Self::new(source);
        *matcher
            .config
            .write()
            .map_err(|_| AppError::InternalError("fuzzy config lock poisoned".into()))? = config;
        Ok(matcher)
    }

    pub fn config(&self) -> AppResult<FuzzyMatcherConfig> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| AppError::InternalError("fuzzy config lock poisoned".into()))
    }

    fn title_similarity(&self, query_title: &str, record: &BookRecord) -> Option<f64> {
        if record.title.trim().is_empty() {
            return None;
        }
        let query = self.normalizer.normalize(query_title);
        let short = self.normalizer.normalize(&record.title);
        let mut best = self.title_strategy.calculate(&query, &short);
        if record.subtitle.is_some() {
            let full = self.normalizer.normalize(&record.full_title());
            best = best.max(self.title_strategy.calculate(&query, &full));
        }
        Some(best)
    }

    /// Average over query authors of the best match among candidate authors
    fn author_similarity(&self, query_authors: &[String], record: &BookRecord) -> Option<f64> {
        if query_authors.is_empty() || record.authors.is_empty() {
            return None;
        }
        let candidates: Vec<String> = record
            .authors
            .iter()
            .map(|a| self.normalizer.normalize(a))
            .collect();

        let total: f64 = query_authors
            .iter()
            .map(|author| {
                let author = self.normalizer.normalize(author);
                candidates
                    .iter()
                    .map(|candidate| self.name_strategy.calculate(&author, candidate))
                    .fold(0.0, f64::max)
            })
            .sum();
        Some(total / query_authors.len() as f64)
    }

    fn score_record(&self, query: &SearchQuery, record: &BookRecord) -> FieldScores {
        FieldScores {
            title: query
                .title()
                .and_then(|title| self.title_similarity(title, record)),
            author: self.author_similarity(query.authors(), record),
            publisher: query.publisher().zip(record.publisher.as_deref()).map(|(q, c)| {
                self.name_strategy
                    .calculate(&self.normalizer.normalize(q), &self.normalizer.normalize(c))
            }),
            year: query
                .year()
                .zip(record.year)
                .map(|(q, c)| (1.0 - (q - c).abs() as f64 / YEAR_SPAN).max(0.0)),
        }
    }

    async fn try_search(&self, query: &SearchQuery) -> AppResult<Vec<SearchResult>> {
        let config = self.config()?;
        let candidates = self.source.find_candidates(query).await?;

        let mut results = Vec::new();
        for record in &candidates {
            let fields = self.score_record(query, record);
            let Some(score) = fields.combine(&config) else {
                continue;
            };
            if score < config.min_similarity_threshold {
                continue;
            }

            let mut details = serde_json::Map::new();
            details.insert("title_similarity".into(), json!(fields.title));
            details.insert("author_similarity".into(), json!(fields.author));
            details.insert("publisher_similarity".into(), json!(fields.publisher));
            details.insert("year_similarity".into(), json!(fields.year));

            results.push(
                SearchResult::new(score, record.to_metadata(), FUZZY_MATCHER_NAME)?
                    .with_details(details),
            );
        }

        results.sort_by(|a, b| b.score().total_cmp(&a.score()));
        results.truncate(config.max_results);

        log::debug!(
            "{}: {} of {} candidates above {:.2}",
            FUZZY_MATCHER_NAME,
            results.len(),
            candidates.len(),
            config.min_similarity_threshold
        );
        Ok(results)
    }
}

#[async_trait]
impl BookMatcher for FuzzyMatcher {
    fn name(&self) -> &'static str {
        FUZZY_MATCHER_NAME
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
                log::warn!("{}: rejected options: {}", FUZZY_MATCHER_NAME, reason);
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
                LogContext::error_with_context(&e, FUZZY_MATCHER_NAME);
                Vec::new()
            }
        }
    }

    fn is_suitable_for_query(&self, query: &SearchQuery) -> bool {
        query.has_title() || query.has_authors()
    }

    fn capabilities(&self) -> Vec<String> {
        ["title_matching", "author_matching", "publisher_matching", "year_matching", "typo_tolerance"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn stats(&self) -> MatcherStats {
        self.stats.snapshot()
    }
}
