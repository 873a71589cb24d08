use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use super::combination_metrics::{CombinationMetrics, StageTimer};
use crate::modules::matching::domain::services::TextNormalizer;
use crate::modules::matching::{IsbnValidator, Metadata, SearchResult, ORCHESTRATED_ALGORITHM};
use crate::shared::utils::LogContext;

/// Weight given to one contributor when averaging a group's scores
pub type CombinationWeight = Arc<dyn Fn(&SearchResult) -> f64 + Send + Sync>;

/// Every contributor counts the same
pub fn uniform_weight() -> CombinationWeight {
    Arc::new(|_| 1.0)
}

/// Titles whose lengths differ by at most this many characters are
/// treated as compatible
const TITLE_LENGTH_TOLERANCE: usize = 3;

/// Groups matcher results that describe the same record and folds each
/// group into one ranked result
pub struct ResultCombiner {
    weight: CombinationWeight,
    normalizer: TextNormalizer,
}

impl ResultCombiner {
    pub fn new() -> Self {
        Self::with_weight(uniform_weight())
    }

    pub fn with_weight(weight: CombinationWeight) -> Self {
        Self {
            weight,
            normalizer: TextNormalizer::comparison_pipeline(),
        }
    }

    /// Group, merge, rank and truncate
    pub fn combine(
        &self,
        results: Vec<SearchResult>,
        max_results: usize,
    ) -> (Vec<SearchResult>, CombinationMetrics) {
        let started = Instant::now();
        let mut metrics = CombinationMetrics::new();
        metrics.input_count = results.len();

        let timer = StageTimer::start("grouping");
        let groups = self.group(results);
        timer.stop(&mut metrics);
        metrics.groups = groups.len();
        metrics.merged_groups = groups.iter().filter(|g| g.len() > 1).count();

        let timer = StageTimer::start("merging");
        let mut combined: Vec<SearchResult> = groups
            .into_iter()
            .filter_map(|group| self.merge_group(group))
            .collect();
        timer.stop(&mut metrics);

        let timer = StageTimer::start("ranking");
        sort_by_score(&mut combined);
        if combined.len() > max_results {
            metrics.truncated_count = combined.len() - max_results;
            combined.truncate(max_results);
        }
        timer.stop(&mut metrics);

        metrics.output_count = combined.len();
        metrics.total_duration = started.elapsed();
        (combined, metrics)
    }

    /// Partition results into groups describing the same record
    ///
    /// Results are visited best first, so every group leads with its
    /// highest-scoring member. A result matching several groups bridges
    /// them into one.
    pub fn group(&self, mut results: Vec<SearchResult>) -> Vec<Vec<SearchResult>> {
        sort_by_score(&mut results);

        let mut groups: Vec<Vec<SearchResult>> = Vec::new();
        for result in results {
            let matching: Vec<usize> = groups
                .iter()
                .enumerate()
                .filter(|(_, group)| group.iter().any(|member| self.same_record(member, &result)))
                .map(|(index, _)| index)
                .collect();

            match matching.split_first() {
                None => groups.push(vec![result]),
                Some((&target, bridged)) => {
                    // Higher indices first so `target` stays valid
                    for &index in bridged.iter().rev() {
                        let absorbed = groups.remove(index);
                        groups[target].extend(absorbed);
                    }
                    groups[target].push(result);
                    sort_by_score(&mut groups[target]);
                }
            }
        }
        groups
    }

    /// Equal ISBNs, or compatible titles and first authors
    ///
    /// When either side lacks a first author the titles must contain one
    /// another; the looser length rule alone is not enough.
    pub fn same_record(&self, a: &SearchResult, b: &SearchResult) -> bool {
        if let (Some(x), Some(y)) = (isbn_key(a), isbn_key(b)) {
            if x == y {
                return true;
            }
        }

        let (Some(title_a), Some(title_b)) = (self.key(a.title()), self.key(b.title())) else {
            return false;
        };

        match (self.key(a.first_author()), self.key(b.first_author())) {
            (Some(author_a), Some(author_b)) => {
                titles_compatible(&title_a, &title_b) && contains_either(&author_a, &author_b)
            }
            _ => contains_either(&title_a, &title_b),
        }
    }

    fn key(&self, value: Option<&str>) -> Option<String> {
        value
            .map(|v| self.normalizer.normalize(v))
            .filter(|v| !v.is_empty())
    }

    fn merge_group(&self, group: Vec<SearchResult>) -> Option<SearchResult> {
        if group.is_empty() {
            return None;
        }

        let weights: Vec<f64> = group
            .iter()
            .map(|result| {
                let weight = (self.weight)(result);
                if weight.is_finite() && weight > 0.0 {
                    weight
                } else {
                    0.0
                }
            })
            .collect();
        let total_weight: f64 = weights.iter().sum();

        let score = if total_weight > 0.0 {
            group
                .iter()
                .zip(&weights)
                .map(|(result, weight)| result.score() * weight)
                .sum::<f64>()
                / total_weight
        } else {
            group.iter().map(SearchResult::score).sum::<f64>() / group.len() as f64
        };

        let mut metadata = Metadata::new();
        for result in &group {
            merge_metadata(&mut metadata, result.metadata());
        }

        let mut source_algorithms: Vec<&str> = Vec::new();
        let mut individual_scores = Map::new();
        for result in &group {
            let algorithm = result.algorithm();
            if !source_algorithms.contains(&algorithm) {
                source_algorithms.push(algorithm);
            }
            // Best score per algorithm; members arrive best first
            individual_scores
                .entry(algorithm.to_string())
                .or_insert_with(|| json!(result.score()));
        }

        let mut details = Metadata::new();
        details.insert("source_algorithms".into(), json!(source_algorithms));
        details.insert("individual_scores".into(), Value::Object(individual_scores));
        details.insert("group_size".into(), json!(group.len()));

        match SearchResult::new(score.clamp(0.0, 1.0), metadata, ORCHESTRATED_ALGORITHM) {
            Ok(result) => Some(result.with_details(details)),
            Err(e) => {
                LogContext::error_with_context(&e, "Combining result group");
                None
            }
        }
    }
}

impl Default for ResultCombiner {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort by descending score
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
}

fn isbn_key(result: &SearchResult) -> Option<String> {
    let raw = result.isbn()?;
    IsbnValidator::normalize_to_isbn13(raw)
        .or_else(|| Some(IsbnValidator::clean(raw)))
        .filter(|isbn| !isbn.is_empty())
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn titles_compatible(a: &str, b: &str) -> bool {
    contains_either(a, b) || a.chars().count().abs_diff(b.chars().count()) <= TITLE_LENGTH_TOLERANCE
}

/// Fold `incoming` into `merged`, keeping the more complete value per key
fn merge_metadata(merged: &mut Metadata, incoming: &Metadata) {
    for (key, value) in incoming {
        match merged.get(key) {
            Some(current) if !more_complete(value, current) => {}
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
}

fn more_complete(candidate: &Value, current: &Value) -> bool {
    match (candidate, current) {
        (Value::Null, _) => false,
        (_, Value::Null) => true,
        (Value::String(c), Value::String(e)) => c.trim().chars().count() > e.trim().chars().count(),
        (Value::Array(c), Value::Array(e)) => c.len() > e.len(),
        (Value::Object(c), Value::Object(e)) => c.len() > e.len(),
        _ => false,
    }
}
