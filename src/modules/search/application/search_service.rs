use std::sync::Arc;

use crate::modules::cache::{SearchCache, SearchCacheStats};
use crate::modules::matching::{
    CandidateSource, FuzzyMatcher, IsbnMatcher, SearchQuery, SearchResult, SemanticMatcher,
};
use crate::modules::search::domain::{SearchOrchestrator, SearchStrategy};
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppResult;

/// Answer to a search, with where it came from
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub from_cache: bool,
    /// Strategy executed; `None` when served from cache
    pub strategy: Option<SearchStrategy>,
}

/// Cache-aware entry point for bibliographic searches
///
/// Consults the search cache first and only runs the orchestrator on a
/// miss. Non-empty answers are written back; an empty answer may just
/// mean every matcher failed this time, so it is never cached.
#[derive(Clone)]
pub struct SearchService {
    orchestrator: Arc<SearchOrchestrator>,
    cache: Arc<SearchCache>,
}

impl SearchService {
    pub fn new(orchestrator: Arc<SearchOrchestrator>, cache: Arc<SearchCache>) -> Self {
        Self {
            orchestrator,
            cache,
        }
    }

    /// Build the full stack with the built-in matchers over one candidate source
    pub async fn from_config(
        config: &EngineConfig,
        source: Arc<dyn CandidateSource>,
    ) -> AppResult<Self> {
        config.validate()?;

        let orchestrator = SearchOrchestrator::new(config.orchestrator.clone())?;
        orchestrator
            .register_matcher(Arc::new(IsbnMatcher::new(Arc::clone(&source))))
            .await;
        orchestrator
            .register_matcher(Arc::new(FuzzyMatcher::new(Arc::clone(&source))))
            .await;
        orchestrator
            .register_matcher(Arc::new(SemanticMatcher::new(Arc::clone(&source))))
            .await;

        let cache = SearchCache::from_config(&config.cache, config.search_cache.clone())?;
        log::info!(
            "Search service ready over {} with matchers {:?}",
            source.name(),
            orchestrator.matcher_names().await
        );

        Ok(Self::new(Arc::new(orchestrator), Arc::new(cache)))
    }

    pub async fn search(&self, query: &SearchQuery) -> SearchResponse {
        self.search_with_strategy(query, self.orchestrator.config().default_strategy)
            .await
    }

    pub async fn search_with_strategy(
        &self,
        query: &SearchQuery,
        strategy: SearchStrategy,
    ) -> SearchResponse {
        if query.is_empty() {
            log::debug!("Search service: ignoring empty query");
            return SearchResponse {
                results: Vec::new(),
                from_cache: false,
                strategy: None,
            };
        }

        if let Some(results) = self.cache.get(query) {
            log::debug!(
                "Search service: '{}' served from cache ({} results)",
                query.describe(),
                results.len()
            );
            return SearchResponse {
                results,
                from_cache: true,
                strategy: None,
            };
        }

        let outcome = self.orchestrator.search_with_strategy(query, strategy).await;
        if !outcome.results.is_empty() {
            self.cache.put(query, &outcome.results);
        }

        SearchResponse {
            results: outcome.results,
            from_cache: false,
            strategy: Some(outcome.strategy),
        }
    }

    /// Drop the cached answer for a query
    pub fn invalidate(&self, query: &SearchQuery) -> bool {
        self.cache.invalidate(query)
    }

    pub fn cache_stats(&self) -> SearchCacheStats {
        self.cache.stats()
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }
}
