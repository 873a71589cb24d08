use crate::shared::errors::{AppError, AppResult};

/// Jaro score below which the Winkler prefix boost is not applied
const WINKLER_BOOST_THRESHOLD: f64 = 0.7;

/// Longest common prefix the Winkler boost rewards
const WINKLER_MAX_PREFIX: usize = 4;

/// Default Winkler prefix scaling factor
pub const DEFAULT_WINKLER_PREFIX_SCALE: f64 = 0.1;

/// Classic edit distance (insertions, deletions, substitutions) over chars
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Edit distance scaled into a 0.0-1.0 similarity
pub fn normalized_levenshtein(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Jaro similarity with a match window of `max(|a|, |b|) / 2 - 1`
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro(a, b)
}

/// Jaro-Winkler similarity
///
/// The prefix boost is only applied once the plain Jaro score reaches 0.7;
/// at most four leading characters count toward it.
pub fn jaro_winkler_similarity(a: &str, b: &str, prefix_scale: f64) -> f64 {
    let jaro = jaro_similarity(a, b);
    if jaro < WINKLER_BOOST_THRESHOLD {
        return jaro;
    }

    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .take(WINKLER_MAX_PREFIX)
        .count();

    (jaro + prefix as f64 * prefix_scale * (1.0 - jaro)).min(1.0)
}

/// Strategy for calculating similarity between two strings
///
/// This trait enables different similarity algorithms to be used interchangeably,
/// making the system testable and extensible.
pub trait SimilarityStrategy: Send + Sync {
    /// Calculate similarity between query and target
    ///
    /// Returns a value between 0.0 (completely different) and 1.0 (identical)
    fn calculate(&self, query: &str, target: &str) -> f64;

    /// Get the name of this strategy for logging/debugging
    fn name(&self) -> &'static str;
}

/// Jaro-Winkler similarity strategy
///
/// Particularly good for short strings and names (authors, publishers).
/// Gives more weight to matching prefixes.
#[derive(Debug, Clone)]
pub struct JaroWinklerStrategy {
    prefix_scale: f64,
}

impl JaroWinklerStrategy {
    pub fn new(prefix_scale: f64) -> Self {
        Self { prefix_scale }
    }
}

impl Default for JaroWinklerStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_WINKLER_PREFIX_SCALE)
    }
}

impl SimilarityStrategy for JaroWinklerStrategy {
    fn calculate(&self, query: &str, target: &str) -> f64 {
        jaro_winkler_similarity(query, target, self.prefix_scale)
    }

    fn name(&self) -> &'static str {
        "JaroWinkler"
    }
}

/// Normalized Levenshtein similarity strategy
///
/// Good for detecting typos and character-level differences.
#[derive(Debug, Clone)]
pub struct LevenshteinStrategy;

impl SimilarityStrategy for LevenshteinStrategy {
    fn calculate(&self, query: &str, target: &str) -> f64 {
        normalized_levenshtein(query, target)
    }

    fn name(&self) -> &'static str {
        "Levenshtein"
    }
}

/// Hybrid strategy that combines multiple strategies with weighted average
pub struct HybridStrategy {
    strategies: Vec<(Box<dyn SimilarityStrategy>, f64)>,
}

impl HybridStrategy {
    /// Create a new hybrid strategy
    ///
    /// Weights must sum to 1.0 (within 0.01).
    pub fn new(strategies: Vec<(Box<dyn SimilarityStrategy>, f64)>) -> AppResult<Self> {
        let weight_sum: f64 = strategies.iter().map(|(_, w)| w).sum();
        if (weight_sum - 1.0).abs() >= 0.01 {
            return Err(AppError::ConfigurationError(format!(
                "Strategy weights must sum to 1.0, got {}",
                weight_sum
            )));
        }
        Ok(Self { strategies })
    }

    /// Jaro-Winkler (70%) + Levenshtein (30%)
    pub fn default_hybrid() -> Self {
        Self {
            strategies: vec![
                (Box::new(JaroWinklerStrategy::default()), 0.7),
                (Box::new(LevenshteinStrategy), 0.3),
            ],
        }
    }
}

impl SimilarityStrategy for HybridStrategy {
    fn calculate(&self, query: &str, target: &str) -> f64 {
        self.strategies
            .iter()
            .map(|(strategy, weight)| strategy.calculate(query, target) * weight)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "Hybrid"
    }
}
