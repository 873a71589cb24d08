pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{SearchResponse, SearchService};
pub use domain::{
    CombinationMetrics, CombinationWeight, OrchestratorConfig, ResultCombiner, SearchOrchestrator,
    SearchOutcome, SearchStrategy,
};
pub use infrastructure::{MatcherMetricsCollector, MatcherMetricsSummary};
