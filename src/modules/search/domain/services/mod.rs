pub mod combination_metrics;
pub mod result_combiner;
pub mod search_orchestrator;

pub use combination_metrics::{CombinationMetrics, StageTimer};
pub use result_combiner::{sort_by_score, uniform_weight, CombinationWeight, ResultCombiner};
pub use search_orchestrator::{SearchOrchestrator, SearchOutcome};
