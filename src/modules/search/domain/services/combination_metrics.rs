use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Metrics for one pass of result combination
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombinationMetrics {
    /// Duration of the whole combination pass
    pub total_duration: Duration,

    /// Duration of each stage by name
    pub stage_durations: HashMap<String, Duration>,

    /// Matcher results fed into combination
    pub input_count: usize,

    /// Ranked results returned
    pub output_count: usize,

    /// Groups of results judged to describe the same record
    pub groups: usize,

    /// Groups with more than one contributor
    pub merged_groups: usize,

    /// Groups cut by the result limit
    pub truncated_count: usize,
}

impl CombinationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of inputs folded into another result
    pub fn deduplication_rate(&self) -> f32 {
        if self.input_count == 0 {
            return 0.0;
        }

        let deduplicated = self.input_count.saturating_sub(self.groups);
        (deduplicated as f32 / self.input_count as f32) * 100.0
    }

    pub fn report(&self) -> String {
        let mut lines = vec![
            "=== Combination Metrics ===".to_string(),
            format!("Total Duration: {}ms", self.total_duration.as_millis()),
            format!("Input Count: {}", self.input_count),
            format!("Output Count: {}", self.output_count),
            format!("Groups: {} ({} merged)", self.groups, self.merged_groups),
            format!("Deduplication Rate: {:.1}%", self.deduplication_rate()),
            format!("Truncated Count: {}", self.truncated_count),
            "".to_string(),
            "Stage Durations:".to_string(),
        ];

        // Slowest first
        let mut stages: Vec<_> = self.stage_durations.iter().collect();
        stages.sort_by(|a, b| b.1.cmp(a.1));

        for (stage, duration) in stages {
            lines.push(format!("  {}: {}us", stage, duration.as_micros()));
        }

        lines.join("\n")
    }
}

/// Helper for timing combination stages
pub struct StageTimer {
    stage_name: String,
    start: Instant,
}

impl StageTimer {
    pub fn start(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            start: Instant::now(),
        }
    }

    /// Stop timing and record the duration under the stage name
    pub fn stop(self, metrics: &mut CombinationMetrics) -> Duration {
        let duration = self.start.elapsed();
        metrics.stage_durations.insert(self.stage_name, duration);
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplication_rate() {
        let metrics = CombinationMetrics {
            input_count: 4,
            groups: 3,
            ..CombinationMetrics::new()
        };
        assert_eq!(metrics.deduplication_rate(), 25.0);
        assert_eq!(CombinationMetrics::new().deduplication_rate(), 0.0);
    }

    #[test]
    fn test_stage_timer_records_stage() {
        let mut metrics = CombinationMetrics::new();
        StageTimer::start("grouping").stop(&mut metrics);
        assert!(metrics.stage_durations.contains_key("grouping"));
        assert!(metrics.report().contains("grouping"));
    }
}
