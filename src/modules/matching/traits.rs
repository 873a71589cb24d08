use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::modules::matching::domain::entities::{SearchQuery, SearchResult};

/// Opaque per-matcher options, parsed by each matcher into its own config
pub type MatcherOptions = Map<String, Value>;

#[async_trait]
pub trait BookMatcher: Send + Sync {
    /// Registry name, also used as the `SearchResult` algorithm tag
    fn name(&self) -> &'static str;

    /// Apply new options; invalid options return false and keep the
    /// previous configuration
    fn configure(&self, options: &MatcherOptions) -> bool;

    /// Search candidates for the query
    ///
    /// Never fails: internal errors are logged and yield an empty list.
    async fn search(&self, query: &SearchQuery) -> Vec<SearchResult>;

    fn is_suitable_for_query(&self, query: &SearchQuery) -> bool;

    fn capabilities(&self) -> Vec<String>;

    fn stats(&self) -> MatcherStats;
}

/// Snapshot of a matcher's counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherStats {
    pub searches: u64,
    pub results_returned: u64,
    pub failures: u64,
    pub cache_hits: u64,
}

/// Lock-free counters shared by a matcher across concurrent searches
#[derive(Debug, Default)]
pub struct MatcherStatsCounter {
    searches: AtomicU64,
    results_returned: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
}

impl MatcherStatsCounter {
    pub fn record_search(&self, results: usize) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.results_returned
            .fetch_add(results as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MatcherStats {
        MatcherStats {
            searches: self.searches.load(Ordering::Relaxed),
            results_returned: self.results_returned.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// Read an optional f64 option, rejecting non-numeric values
pub(crate) fn option_f64(options: &MatcherOptions, key: &str) -> Result<Option<f64>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("option '{}' must be a number, got {}", key, value)),
    }
}

/// Read an optional non-negative integer option
pub(crate) fn option_usize(options: &MatcherOptions, key: &str) -> Result<Option<usize>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| format!("option '{}' must be a non-negative integer, got {}", key, value)),
    }
}

/// Read an optional map of field weights (`{"title": 0.5, ...}`)
pub(crate) fn option_weights(
    options: &MatcherOptions,
    key: &str,
) -> Result<Option<Vec<(String, f64)>>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(field, weight)| {
                weight
                    .as_f64()
                    .filter(|w| w.is_finite() && *w >= 0.0)
                    .map(|w| (field.clone(), w))
                    .ok_or_else(|| format!("weight '{}' must be a non-negative number", field))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(format!("option '{}' must be an object, got {}", key, other)),
    }
}

/// Scale weights so they sum to 1.0; fails if they sum to zero
pub(crate) fn normalize_weights(weights: &mut [f64]) -> Result<(), String> {
    let sum: f64 = weights.iter().sum();
    if sum <= f64::EPSILON {
        return Err("weights must not all be zero".to_string());
    }
    if (sum - 1.0).abs() > 0.01 {
        weights.iter_mut().for_each(|w| *w /= sum);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> MatcherOptions {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_stats_counter_snapshot() {
        let counter = MatcherStatsCounter::default();
        counter.record_search(3);
        counter.record_search(0);
        counter.record_failure();
        counter.record_cache_hit();

        let stats = counter.snapshot();
        assert_eq!(stats.searches, 3);
        assert_eq!(stats.results_returned, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_option_readers() {
        let opts = options(json!({"threshold": 0.5, "max": 3, "bad": "x", "weights": {"title": 1.0}}));
        assert_eq!(option_f64(&opts, "threshold"), Ok(Some(0.5)));
        assert_eq!(option_f64(&opts, "missing"), Ok(None));
        assert!(option_f64(&opts, "bad").is_err());
        assert_eq!(option_usize(&opts, "max"), Ok(Some(3)));
        assert_eq!(
            option_weights(&opts, "weights"),
            Ok(Some(vec![("title".to_string(), 1.0)]))
        );
        assert!(option_weights(&opts, "threshold").is_err());
    }

    #[test]
    fn test_normalize_weights() {
        let mut weights = [2.0, 1.0, 1.0];
        normalize_weights(&mut weights).unwrap();
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((weights[0] - 0.5).abs() < 1e-9);

        let mut zeros = [0.0, 0.0];
        assert!(normalize_weights(&mut zeros).is_err());
    }
}
