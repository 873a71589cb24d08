use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::errors::{AppError, AppResult};

/// Free-form key/value description of a candidate record
pub type Metadata = Map<String, Value>;

/// Algorithm tag used for results produced by combining several matchers
pub const ORCHESTRATED_ALGORITHM: &str = "OrchestratedSearch";

/// A scored candidate produced by one matcher (or by the orchestrator)
///
/// The score is always within `[0.0, 1.0]`; construction and
/// deserialization both reject anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchResult")]
pub struct SearchResult {
    score: f64,
    metadata: Metadata,
    algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Metadata>,
}

#[derive(Deserialize)]
struct RawSearchResult {
    score: f64,
    #[serde(default)]
    metadata: Metadata,
    algorithm: String,
    #[serde(default)]
    details: Option<Metadata>,
}

impl TryFrom<RawSearchResult> for SearchResult {
    type Error = AppError;

    fn try_from(raw: RawSearchResult) -> Result<Self, Self::Error> {
        let result = SearchResult::new(raw.score, raw.metadata, raw.algorithm)?;
        Ok(match raw.details {
            Some(details) => result.with_details(details),
            None => result,
        })
    }
}

impl SearchResult {
    pub fn new(score: f64, metadata: Metadata, algorithm: impl Into<String>) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(AppError::ValidationError(format!(
                "Score must be between 0.0 and 1.0, got {}",
                score
            )));
        }

        Ok(Self {
            score,
            metadata,
            algorithm: algorithm.into(),
            details: None,
        })
    }

    pub fn with_details(mut self, details: Metadata) -> Self {
        self.details = Some(details);
        self
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn details(&self) -> Option<&Metadata> {
        self.details.as_ref()
    }

    /// String-valued metadata field, if present and non-empty
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata_str("title")
    }

    /// Authors listed in the metadata, accepting either an array or a single string
    pub fn authors(&self) -> Vec<&str> {
        match self.metadata.get("authors") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) if !single.is_empty() => vec![single.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors().into_iter().next()
    }

    /// Prefers the ISBN-13 field, falls back to the ISBN-10 field
    pub fn isbn(&self) -> Option<&str> {
        self.metadata_str("isbn_13")
            .or_else(|| self.metadata_str("isbn"))
            .or_else(|| self.metadata_str("isbn_10"))
    }
}
