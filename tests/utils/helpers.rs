/// Fake matchers for exercising the orchestrator
use async_trait::async_trait;
use bookmatch::modules::matching::{
    BookMatcher, MatcherOptions, MatcherStats, SearchQuery, SearchResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Panics on every search
pub struct FailingMatcher {
    pub name: &'static str,
}

#[async_trait]
impl BookMatcher for FailingMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&self, _options: &MatcherOptions) -> bool {
        true
    }

    async fn search(&self, _query: &SearchQuery) -> Vec<SearchResult> {
        panic!("{} always fails", self.name)
    }

    fn is_suitable_for_query(&self, _query: &SearchQuery) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["failing".to_string()]
    }

    fn stats(&self) -> MatcherStats {
        MatcherStats::default()
    }
}

/// Sleeps before answering with its canned results
pub struct SlowMatcher {
    pub name: &'static str,
    pub delay: Duration,
    pub results: Vec<SearchResult>,
}

#[async_trait]
impl BookMatcher for SlowMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&self, _options: &MatcherOptions) -> bool {
        true
    }

    async fn search(&self, _query: &SearchQuery) -> Vec<SearchResult> {
        tokio::time::sleep(self.delay).await;
        self.results.clone()
    }

    fn is_suitable_for_query(&self, _query: &SearchQuery) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["slow".to_string()]
    }

    fn stats(&self) -> MatcherStats {
        MatcherStats::default()
    }
}

/// Returns canned results and counts how often it was asked
pub struct CountingMatcher {
    pub name: &'static str,
    pub results: Vec<SearchResult>,
    calls: AtomicUsize,
}

impl CountingMatcher {
    pub fn new(name: &'static str, results: Vec<SearchResult>) -> Self {
        Self {
            name,
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookMatcher for CountingMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&self, _options: &MatcherOptions) -> bool {
        true
    }

    async fn search(&self, _query: &SearchQuery) -> Vec<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results.clone()
    }

    fn is_suitable_for_query(&self, _query: &SearchQuery) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["counting".to_string()]
    }

    fn stats(&self) -> MatcherStats {
        let calls = self.calls() as u64;
        MatcherStats {
            searches: calls,
            results_returned: calls * self.results.len() as u64,
            ..MatcherStats::default()
        }
    }
}

/// Blocks its thread with synchronous work before answering
pub struct BlockingMatcher {
    pub name: &'static str,
    pub delay: Duration,
    pub results: Vec<SearchResult>,
}

#[async_trait]
impl BookMatcher for BlockingMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&self, _options: &MatcherOptions) -> bool {
        true
    }

    async fn search(&self, _query: &SearchQuery) -> Vec<SearchResult> {
        std::thread::sleep(self.delay);
        self.results.clone()
    }

    fn is_suitable_for_query(&self, _query: &SearchQuery) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["blocking".to_string()]
    }

    fn stats(&self) -> MatcherStats {
        MatcherStats::default()
    }
}
