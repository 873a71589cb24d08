pub mod metrics;

pub use metrics::{MatcherMetrics, MatcherMetricsCollector, MatcherMetricsSummary};
