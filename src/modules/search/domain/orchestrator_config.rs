use std::time::Duration;

use super::value_objects::SearchStrategy;
use crate::modules::matching::{FUZZY_MATCHER_NAME, ISBN_MATCHER_NAME, SEMANTIC_MATCHER_NAME};
use crate::shared::errors::{AppError, AppResult};

/// Tuning for the search orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Matcher tasks allowed to run at once
    pub max_workers: usize,
    /// Upper bound on a single matcher invocation
    pub task_timeout: Duration,
    /// Length cap of the final ranked list
    pub max_results: usize,
    pub default_strategy: SearchStrategy,
    /// Sequential runs stop once a matcher's top score reaches this
    pub sequential_short_circuit: f64,
    /// Adaptive runs stop after the first matcher when its top score reaches this
    pub adaptive_threshold: f64,
    /// Matchers run in the adaptive parallel phase
    pub adaptive_fanout: usize,
    /// Matcher names from most to least preferred; unlisted matchers come last
    pub preference_order: Vec<String>,
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self {
            max_workers: 4,
            task_timeout: Duration::from_secs(30),
            max_results: 10,
            default_strategy: SearchStrategy::Auto,
            sequential_short_circuit: 0.8,
            adaptive_threshold: 0.9,
            adaptive_fanout: 3,
            preference_order: vec![
                ISBN_MATCHER_NAME.to_string(),
                FUZZY_MATCHER_NAME.to_string(),
                SEMANTIC_MATCHER_NAME.to_string(),
            ],
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_workers == 0 {
            return Err(AppError::ConfigurationError(
                "max_workers must be greater than 0".to_string(),
            ));
        }
        if self.task_timeout.is_zero() {
            return Err(AppError::ConfigurationError(
                "task_timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(AppError::ConfigurationError(
                "max_results must be greater than 0".to_string(),
            ));
        }
        if self.adaptive_fanout == 0 {
            return Err(AppError::ConfigurationError(
                "adaptive_fanout must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("sequential_short_circuit", self.sequential_short_circuit),
            ("adaptive_threshold", self.adaptive_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::ConfigurationError(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Position of `name` in the preference order
    pub fn preference_rank(&self, name: &str) -> usize {
        self.preference_order
            .iter()
            .position(|preferred| preferred == name)
            .unwrap_or(self.preference_order.len())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}
