use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Execution metrics per matcher, fed by the orchestrator
pub struct MatcherMetricsCollector {
    metrics: Arc<RwLock<HashMap<String, MatcherMetrics>>>,
}

/// Raw counters for one matcher
#[derive(Debug, Clone)]
pub struct MatcherMetrics {
    pub matcher: String,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub timed_out_runs: u64,
    pub results_returned: u64,
    pub total_response_time: Duration,
    pub fastest_response: Duration,
    pub slowest_response: Duration,
}

/// Metrics summary for external consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherMetricsSummary {
    pub matcher: String,
    pub total_runs: u64,
    pub success_rate: f32,
    pub failed_runs: u64,
    pub timed_out_runs: u64,
    pub results_returned: u64,
    pub average_response_time_ms: u64,
    pub fastest_response_ms: u64,
    pub slowest_response_ms: u64,
}

impl MatcherMetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a run that finished in time
    pub async fn record_success(&self, matcher: &str, response_time: Duration, results: usize) {
        let mut metrics = self.metrics.write().await;
        let entry = metrics
            .entry(matcher.to_string())
            .or_insert_with(|| MatcherMetrics::new(matcher));

        entry.total_runs += 1;
        entry.successful_runs += 1;
        entry.results_returned += results as u64;
        entry.total_response_time += response_time;

        if entry.fastest_response > response_time || entry.successful_runs == 1 {
            entry.fastest_response = response_time;
        }
        if entry.slowest_response < response_time {
            entry.slowest_response = response_time;
        }
    }

    /// Record a run that failed or panicked
    pub async fn record_failure(&self, matcher: &str, response_time: Duration) {
        let mut metrics = self.metrics.write().await;
        let entry = metrics
            .entry(matcher.to_string())
            .or_insert_with(|| MatcherMetrics::new(matcher));

        entry.total_runs += 1;
        entry.failed_runs += 1;
        if entry.slowest_response < response_time {
            entry.slowest_response = response_time;
        }
    }

    /// Record a run cut off by the task timeout
    pub async fn record_timeout(&self, matcher: &str, timeout: Duration) {
        let mut metrics = self.metrics.write().await;
        let entry = metrics
            .entry(matcher.to_string())
            .or_insert_with(|| MatcherMetrics::new(matcher));

        entry.total_runs += 1;
        entry.timed_out_runs += 1;
        if entry.slowest_response < timeout {
            entry.slowest_response = timeout;
        }
    }

    pub async fn get_matcher_metrics(&self, matcher: &str) -> Option<MatcherMetricsSummary> {
        let metrics = self.metrics.read().await;
        metrics.get(matcher).map(|m| m.to_summary())
    }

    pub async fn get_all_metrics(&self) -> HashMap<String, MatcherMetricsSummary> {
        let metrics = self.metrics.read().await;
        metrics
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.to_summary()))
            .collect()
    }

    /// Forget a matcher, e.g. after it is unregistered
    pub async fn remove_matcher(&self, matcher: &str) {
        let mut metrics = self.metrics.write().await;
        metrics.remove(matcher);
    }

    pub async fn clear_all_metrics(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.clear();
    }
}

impl Default for MatcherMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherMetrics {
    pub fn new(matcher: &str) -> Self {
        Self {
            matcher: matcher.to_string(),
            total_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            timed_out_runs: 0,
            results_returned: 0,
            total_response_time: Duration::ZERO,
            fastest_response: Duration::ZERO,
            slowest_response: Duration::ZERO,
        }
    }

    pub fn to_summary(&self) -> MatcherMetricsSummary {
        let average_response_time = if self.successful_runs > 0 {
            self.total_response_time.as_millis() as u64 / self.successful_runs
        } else {
            0
        };

        let success_rate = if self.total_runs > 0 {
            self.successful_runs as f32 / self.total_runs as f32
        } else {
            0.0
        };

        MatcherMetricsSummary {
            matcher: self.matcher.clone(),
            total_runs: self.total_runs,
            success_rate,
            failed_runs: self.failed_runs,
            timed_out_runs: self.timed_out_runs,
            results_returned: self.results_returned,
            average_response_time_ms: average_response_time,
            fastest_response_ms: self.fastest_response.as_millis() as u64,
            slowest_response_ms: self.slowest_response.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_and_failure_counts() {
        let collector = MatcherMetricsCollector::new();
        collector
            .record_success("FuzzyMatcher", Duration::from_millis(10), 3)
            .await;
        collector
            .record_success("FuzzyMatcher", Duration::from_millis(30), 1)
            .await;
        collector
            .record_failure("FuzzyMatcher", Duration::from_millis(5))
            .await;
        collector
            .record_timeout("FuzzyMatcher", Duration::from_millis(50))
            .await;

        let summary = collector.get_matcher_metrics("FuzzyMatcher").await.unwrap();
        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.success_rate, 0.5);
        assert_eq!(summary.failed_runs, 1);
        assert_eq!(summary.timed_out_runs, 1);
        assert_eq!(summary.results_returned, 4);
        assert_eq!(summary.average_response_time_ms, 20);
        assert_eq!(summary.fastest_response_ms, 10);
        assert_eq!(summary.slowest_response_ms, 50);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let collector = MatcherMetricsCollector::new();
        collector.record_success("A", Duration::from_millis(1), 0).await;
        collector.record_success("B", Duration::from_millis(1), 0).await;

        collector.remove_matcher("A").await;
        assert!(collector.get_matcher_metrics("A").await.is_none());
        assert_eq!(collector.get_all_metrics().await.len(), 1);

        collector.clear_all_metrics().await;
        assert!(collector.get_all_metrics().await.is_empty());
    }
}
