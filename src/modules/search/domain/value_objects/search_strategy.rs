use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::AppError;

/// How the orchestrator dispatches a query to its matchers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Pick one of the other strategies from the number of suitable matchers
    #[default]
    Auto,
    Parallel,
    Sequential,
    BestMatch,
    Adaptive,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::Auto => "auto",
            SearchStrategy::Parallel => "parallel",
            SearchStrategy::Sequential => "sequential",
            SearchStrategy::BestMatch => "best_match",
            SearchStrategy::Adaptive => "adaptive",
        }
    }

    /// Concrete strategy for `Auto` given how many matchers suit the query
    ///
    /// Non-auto strategies resolve to themselves.
    pub fn resolve(self, suitable_matchers: usize) -> Self {
        match self {
            SearchStrategy::Auto => match suitable_matchers {
                0 | 1 => SearchStrategy::BestMatch,
                2 | 3 => SearchStrategy::Parallel,
                _ => SearchStrategy::Adaptive,
            },
            other => other,
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(SearchStrategy::Auto),
            "parallel" => Ok(SearchStrategy::Parallel),
            "sequential" => Ok(SearchStrategy::Sequential),
            "best_match" | "bestmatch" => Ok(SearchStrategy::BestMatch),
            "adaptive" => Ok(SearchStrategy::Adaptive),
            other => Err(AppError::InvalidInput(format!(
                "Unknown search strategy '{}'",
                other
            ))),
        }
    }
}
