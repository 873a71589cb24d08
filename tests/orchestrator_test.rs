mod utils;

use bookmatch::modules::matching::SearchQuery;
use bookmatch::modules::search::{
    CombinationWeight, OrchestratorConfig, ResultCombiner, SearchOrchestrator, SearchStrategy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use utils::factories::result;
use utils::helpers::{BlockingMatcher, CountingMatcher, FailingMatcher, SlowMatcher};

const TITLES: [&str; 15] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliett",
    "Kilo", "Lima", "Mike", "November", "Oscar",
];

fn orchestrator(config: OrchestratorConfig) -> SearchOrchestrator {
    SearchOrchestrator::new(config).expect("valid orchestrator config")
}

fn query() -> SearchQuery {
    SearchQuery::new().with_title("Anything At All")
}

/// Distinct records that never group together
fn distinct_results(algorithm: &str, count: usize) -> Vec<bookmatch::SearchResult> {
    TITLES
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, title)| {
            let score = ((i * 37) % 100) as f64 / 100.0;
            result(score, title, &format!("Writer {}", title), algorithm)
        })
        .collect()
}

#[tokio::test]
async fn result_list_never_exceeds_max_results_and_is_sorted() {
    let orchestrator = orchestrator(OrchestratorConfig {
        max_results: 5,
        ..OrchestratorConfig::default()
    });
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new("Many", distinct_results("Many", 15))))
        .await;

    for strategy in [
        SearchStrategy::Auto,
        SearchStrategy::Parallel,
        SearchStrategy::Sequential,
        SearchStrategy::BestMatch,
        SearchStrategy::Adaptive,
    ] {
        let outcome = orchestrator.search_with_strategy(&query(), strategy).await;
        assert_eq!(outcome.results.len(), 5, "strategy {}", strategy);
        assert!(
            outcome
                .results
                .windows(2)
                .all(|pair| pair[0].score() >= pair[1].score()),
            "strategy {} returned unsorted results",
            strategy
        );
        assert_eq!(outcome.metrics.truncated_count, 10);
    }
}

#[tokio::test]
async fn failing_matcher_does_not_affect_others() {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    let healthy = Arc::new(CountingMatcher::new("Healthy", distinct_results("Healthy", 3)));
    orchestrator.register_matcher(healthy.clone()).await;
    orchestrator
        .register_matcher(Arc::new(FailingMatcher { name: "Broken" }))
        .await;

    let baseline_orchestrator = orchestrator_with_only(healthy.clone()).await;
    let baseline = baseline_orchestrator.search(&query()).await;

    for _ in 0..3 {
        let results = orchestrator
            .search_with_strategy(&query(), SearchStrategy::Parallel)
            .await
            .results;
        assert_eq!(results, baseline);
    }

    let metrics = orchestrator
        .metrics()
        .get_matcher_metrics("Broken")
        .await
        .unwrap();
    assert_eq!(metrics.failed_runs, 3);
    assert_eq!(metrics.success_rate, 0.0);
}

async fn orchestrator_with_only(matcher: Arc<CountingMatcher>) -> SearchOrchestrator {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator.register_matcher(matcher).await;
    orchestrator
}

#[tokio::test]
async fn timed_out_matcher_is_dropped_without_delaying_batch() {
    let orchestrator = orchestrator(OrchestratorConfig {
        task_timeout: Duration::from_millis(100),
        ..OrchestratorConfig::default()
    });
    orchestrator
        .register_matcher(Arc::new(SlowMatcher {
            name: "Slow",
            delay: Duration::from_secs(10),
            results: distinct_results("Slow", 2),
        }))
        .await;
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new("Fast", distinct_results("Fast", 2))))
        .await;

    let started = Instant::now();
    let outcome = orchestrator
        .search_with_strategy(&query(), SearchStrategy::Parallel)
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.matchers_run, vec!["Fast"]);
    assert!(outcome
        .results
        .iter()
        .all(|r| r.details().unwrap()["source_algorithms"] == json!(["Fast"])));

    let metrics = orchestrator.metrics().get_matcher_metrics("Slow").await.unwrap();
    assert_eq!(metrics.timed_out_runs, 1);
}

#[tokio::test]
async fn blocking_matcher_is_cut_off_at_task_timeout() {
    let orchestrator = orchestrator(OrchestratorConfig {
        task_timeout: Duration::from_millis(200),
        ..OrchestratorConfig::default()
    });
    orchestrator
        .register_matcher(Arc::new(BlockingMatcher {
            name: "Blocking",
            delay: Duration::from_secs(1),
            results: distinct_results("Blocking", 2),
        }))
        .await;
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new("Fast", distinct_results("Fast", 2))))
        .await;

    let started = Instant::now();
    let outcome = orchestrator
        .search_with_strategy(&query(), SearchStrategy::Parallel)
        .await;

    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(outcome.matchers_run, vec!["Fast"]);

    let metrics = orchestrator
        .metrics()
        .get_matcher_metrics("Blocking")
        .await
        .unwrap();
    assert_eq!(metrics.timed_out_runs, 1);
    assert_eq!(metrics.success_rate, 0.0);
}

#[tokio::test]
async fn single_worker_still_runs_every_matcher() {
    let orchestrator = orchestrator(OrchestratorConfig {
        max_workers: 1,
        ..OrchestratorConfig::default()
    });
    for name in ["One", "Two", "Three"] {
        orchestrator
            .register_matcher(Arc::new(SlowMatcher {
                name,
                delay: Duration::from_millis(20),
                results: vec![result(0.5, name, name, name)],
            }))
            .await;
    }

    let outcome = orchestrator
        .search_with_strategy(&query(), SearchStrategy::Parallel)
        .await;
    assert_eq!(outcome.matchers_run.len(), 3);
    assert_eq!(outcome.results.len(), 3);
}

#[tokio::test]
async fn overlapping_answers_are_combined() {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new(
            "First",
            vec![result(0.9, "Effective Java", "Joshua Bloch", "First")],
        )))
        .await;
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new(
            "Second",
            vec![result(0.5, "Effective Java (3rd Edition)", "Bloch", "Second")],
        )))
        .await;

    let results = orchestrator.search(&query()).await;
    assert_eq!(results.len(), 1);
    assert!((results[0].score() - 0.7).abs() < 1e-9);
    assert_eq!(results[0].title(), Some("Effective Java (3rd Edition)"));

    let details = results[0].details().unwrap();
    assert_eq!(details["individual_scores"]["First"], json!(0.9));
    assert_eq!(details["individual_scores"]["Second"], json!(0.5));
}

#[tokio::test]
async fn custom_combination_weight_is_applied() {
    let weight: CombinationWeight = Arc::new(|r| if r.algorithm() == "First" { 4.0 } else { 1.0 });
    let orchestrator =
        orchestrator(OrchestratorConfig::default()).with_combiner(ResultCombiner::with_weight(weight));
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new(
            "First",
            vec![result(1.0, "Dune", "Frank Herbert", "First")],
        )))
        .await;
    orchestrator
        .register_matcher(Arc::new(CountingMatcher::new(
            "Second",
            vec![result(0.5, "Dune", "Frank Herbert", "Second")],
        )))
        .await;

    let results = orchestrator.search(&query()).await;
    assert!((results[0].score() - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn unregistered_matcher_is_no_longer_called() {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    let removable = Arc::new(CountingMatcher::new("Removable", distinct_results("Removable", 1)));
    orchestrator.register_matcher(removable.clone()).await;

    orchestrator.search(&query()).await;
    assert!(orchestrator.unregister_matcher("Removable").await);
    let results = orchestrator.search(&query()).await;

    assert!(results.is_empty());
    assert_eq!(removable.calls(), 1);
    assert!(orchestrator.matcher_names().await.is_empty());
}

#[tokio::test]
async fn sequential_strategy_respects_preference_order() {
    let orchestrator = orchestrator(OrchestratorConfig {
        preference_order: vec!["Preferred".into(), "Fallback".into()],
        ..OrchestratorConfig::default()
    });
    let fallback = Arc::new(CountingMatcher::new(
        "Fallback",
        vec![result(0.95, "Emma", "Jane Austen", "Fallback")],
    ));
    let preferred = Arc::new(CountingMatcher::new(
        "Preferred",
        vec![result(0.85, "Dune", "Frank Herbert", "Preferred")],
    ));
    orchestrator.register_matcher(fallback.clone()).await;
    orchestrator.register_matcher(preferred.clone()).await;

    let outcome = orchestrator
        .search_with_strategy(&query(), SearchStrategy::Sequential)
        .await;
    assert_eq!(outcome.matchers_run, vec!["Preferred"]);
    assert_eq!(preferred.calls(), 1);
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn matcher_stats_are_exposed_per_matcher() {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    let counter = Arc::new(CountingMatcher::new("Counter", distinct_results("Counter", 2)));
    orchestrator.register_matcher(counter).await;

    orchestrator.search(&query()).await;
    orchestrator.search(&query()).await;

    let stats = orchestrator.matcher_stats().await;
    assert_eq!(stats["Counter"].searches, 2);
    assert_eq!(stats["Counter"].results_returned, 4);

    let summary = orchestrator
        .metrics()
        .get_matcher_metrics("Counter")
        .await
        .unwrap();
    assert_eq!(summary.total_runs, 2);
    assert_eq!(summary.success_rate, 1.0);
}
