pub mod monitoring;

pub use monitoring::{MatcherMetricsCollector, MatcherMetricsSummary};
