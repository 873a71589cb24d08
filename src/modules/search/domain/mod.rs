pub mod orchestrator_config;
pub mod services;
pub mod value_objects;

pub use orchestrator_config::OrchestratorConfig;
pub use services::{
    CombinationMetrics, CombinationWeight, ResultCombiner, SearchOrchestrator, SearchOutcome,
};
pub use value_objects::SearchStrategy;
