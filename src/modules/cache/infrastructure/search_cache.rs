use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use super::multi_layer_cache::{MultiLayerCache, MultiLayerStats};
use crate::modules::cache::domain::{CacheConfig, SearchCacheConfig};
use crate::modules::matching::domain::entities::{SearchQuery, SearchResult};
use crate::shared::errors::AppResult;

const KEY_PREFIX: &str = "search:";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate of the underlying tiers, counting a hit in either tier once
    pub layer_hit_rate: f64,
    pub layers: MultiLayerStats,
}

impl SearchCacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// Result cache keyed by the canonical form of a query
///
/// Queries with the same title, authors, ISBN and free text share a key
/// regardless of casing or surrounding whitespace. Only the top results
/// are stored, with a TTL shorter than the generic cache default.
pub struct SearchCache {
    cache: MultiLayerCache<Vec<SearchResult>>,
    config: SearchCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SearchCache {
    pub fn new(cache: MultiLayerCache<Vec<SearchResult>>, config: SearchCacheConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            cache,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn from_config(cache_config: &CacheConfig, config: SearchCacheConfig) -> AppResult<Self> {
        Self::new(MultiLayerCache::from_config(cache_config)?, config)
    }

    /// Stable key for a query: SHA-256 of `[title, authors, isbn, text_content]`
    ///
    /// Fields are hashed as a JSON array so separators inside a field
    /// cannot make two different queries collide.
    pub fn cache_key(query: &SearchQuery) -> String {
        let canonical = |s: Option<&str>| s.map(|v| v.trim().to_lowercase()).unwrap_or_default();
        let authors: Vec<String> = query
            .authors()
            .iter()
            .map(|a| a.trim().to_lowercase())
            .collect();

        let material = json!([
            canonical(query.title()),
            authors,
            canonical(query.isbn()),
            canonical(query.text_content())
        ])
        .to_string();
        format!("{}{}", KEY_PREFIX, hex::encode(Sha256::digest(material.as_bytes())))
    }

    pub fn get(&self, query: &SearchQuery) -> Option<Vec<SearchResult>> {
        let found = self.cache.get(&Self::cache_key(query));
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store the top results for a query
    pub fn put(&self, query: &SearchQuery, results: &[SearchResult]) {
        let top: Vec<SearchResult> = results
            .iter()
            .take(self.config.max_cached_results)
            .cloned()
            .collect();
        self.cache
            .put_with_ttl(&Self::cache_key(query), top, Some(self.config.result_ttl));
    }

    pub fn invalidate(&self, query: &SearchQuery) -> bool {
        self.cache.delete(&Self::cache_key(query))
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn config(&self) -> &SearchCacheConfig {
        &self.config
    }

    pub fn stats(&self) -> SearchCacheStats {
        let layers = self.cache.stats();
        SearchCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            layer_hit_rate: layers.overall_hit_rate(),
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::matching::domain::entities::Metadata;
    use std::time::Duration;

    fn result(score: f64, title: &str) -> SearchResult {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), json!(title));
        SearchResult::new(score, metadata, "FuzzyMatcher").unwrap()
    }

    fn memory_cache(config: SearchCacheConfig) -> SearchCache {
        SearchCache::from_config(&CacheConfig::default(), config).unwrap()
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let a = SearchQuery::new().with_title("Dune ").with_author("Frank Herbert");
        let b = SearchQuery::new().with_title("dune").with_author(" frank herbert");
        assert_eq!(SearchCache::cache_key(&a), SearchCache::cache_key(&b));
    }

    #[test]
    fn test_key_distinguishes_fields() {
        let title = SearchQuery::new().with_title("1984");
        let text = SearchQuery::new().with_text_content("1984");
        assert_ne!(SearchCache::cache_key(&title), SearchCache::cache_key(&text));
        assert!(SearchCache::cache_key(&title).starts_with("search:"));
    }

    #[test]
    fn test_key_separators_inside_fields_do_not_collide() {
        let one_author = SearchQuery::new().with_authors(["Lutz, Mark"]);
        let two_authors = SearchQuery::new().with_authors(["Lutz", "Mark"]);
        assert_ne!(
            SearchCache::cache_key(&one_author),
            SearchCache::cache_key(&two_authors)
        );

        let piped_title = SearchQuery::new().with_title("a|b");
        let split = SearchQuery::new().with_title("a").with_author("b");
        assert_ne!(SearchCache::cache_key(&piped_title), SearchCache::cache_key(&split));
    }

    #[test]
    fn test_only_top_results_are_stored() {
        let cache = memory_cache(SearchCacheConfig {
            max_cached_results: 2,
            ..SearchCacheConfig::default()
        });
        let query = SearchQuery::new().with_title("Dune");
        let results = vec![result(0.9, "a"), result(0.8, "b"), result(0.7, "c")];

        cache.put(&query, &results);
        let cached = cache.get(&query).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].title(), Some("a"));
    }

    #[test]
    fn test_hits_and_misses_counted() {
        let cache = memory_cache(SearchCacheConfig::default());
        let query = SearchQuery::new().with_title("Dune");

        assert!(cache.get(&query).is_none());
        cache.put(&query, &[result(0.9, "Dune")]);
        assert!(cache.get(&query).is_some());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < 1e-9);
        assert!((stats.layer_hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalidate() {
        let cache = memory_cache(SearchCacheConfig::default());
        let query = SearchQuery::new().with_title("Dune");
        cache.put(&query, &[result(0.9, "Dune")]);

        assert!(cache.invalidate(&query));
        assert!(cache.get(&query).is_none());
    }

    #[test]
    fn test_zero_ttl_config_rejected() {
        let config = SearchCacheConfig {
            result_ttl: Duration::ZERO,
            ..SearchCacheConfig::default()
        };
        assert!(SearchCache::from_config(&CacheConfig::default(), config).is_err());
    }
}
