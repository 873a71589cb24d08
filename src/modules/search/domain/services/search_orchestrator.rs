use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;

use super::combination_metrics::CombinationMetrics;
use super::result_combiner::ResultCombiner;
use crate::modules::matching::{BookMatcher, MatcherOptions, MatcherStats, SearchQuery, SearchResult};
use crate::modules::search::domain::{OrchestratorConfig, SearchStrategy};
use crate::modules::search::infrastructure::MatcherMetricsCollector;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{LogContext, TimedOperation};

/// Results of one matcher invocation that finished in time
#[derive(Debug, Clone)]
struct MatcherRun {
    matcher: &'static str,
    results: Vec<SearchResult>,
}

impl MatcherRun {
    fn top_score(&self) -> f64 {
        self.results
            .iter()
            .map(SearchResult::score)
            .fold(0.0, f64::max)
    }
}

/// Everything a caller may want to know about one orchestrated search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// Strategy actually executed (`Auto` is resolved)
    pub strategy: SearchStrategy,
    /// Matchers that completed and contributed to the combination
    pub matchers_run: Vec<String>,
    pub metrics: CombinationMetrics,
}

impl SearchOutcome {
    fn empty(strategy: SearchStrategy) -> Self {
        Self {
            results: Vec::new(),
            strategy,
            matchers_run: Vec::new(),
            metrics: CombinationMetrics::new(),
        }
    }
}

/// Dispatches queries to registered matchers and combines their answers
///
/// Every matcher invocation is one spawned task holding a worker permit
/// and bounded by the task timeout. A task that times out, panics or
/// loses its worker is dropped from that search only; the rest of the
/// batch is unaffected and callers always get a (possibly empty) list.
pub struct SearchOrchestrator {
    matchers: RwLock<HashMap<String, Arc<dyn BookMatcher>>>,
    config: OrchestratorConfig,
    workers: Arc<Semaphore>,
    combiner: ResultCombiner,
    metrics: Arc<MatcherMetricsCollector>,
}

impl SearchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            matchers: RwLock::new(HashMap::new()),
            workers: Arc::new(Semaphore::new(config.max_workers)),
            config,
            combiner: ResultCombiner::new(),
            metrics: Arc::new(MatcherMetricsCollector::new()),
        })
    }

    /// Replace the result combiner (e.g. one with a custom weight)
    pub fn with_combiner(mut self, combiner: ResultCombiner) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MatcherMetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Register a matcher under its own name, returning any matcher it replaced
    pub async fn register_matcher(
        &self,
        matcher: Arc<dyn BookMatcher>,
    ) -> Option<Arc<dyn BookMatcher>> {
        let name = matcher.name().to_string();
        let mut matchers = self.matchers.write().await;
        let previous = matchers.insert(name.clone(), matcher);
        match &previous {
            Some(_) => log::info!("ORCHESTRATOR: Replaced matcher {}", name),
            None => log::info!("ORCHESTRATOR: Registered matcher {}", name),
        }
        previous
    }

    pub async fn unregister_matcher(&self, name: &str) -> bool {
        let removed = self.matchers.write().await.remove(name).is_some();
        if removed {
            self.metrics.remove_matcher(name).await;
            log::info!("ORCHESTRATOR: Unregistered matcher {}", name);
        }
        removed
    }

    /// Registered matcher names in preference order
    pub async fn matcher_names(&self) -> Vec<String> {
        let matchers = self.matchers.read().await;
        let mut names: Vec<String> = matchers.keys().cloned().collect();
        names.sort_by(|a, b| {
            self.config
                .preference_rank(a)
                .cmp(&self.config.preference_rank(b))
                .then_with(|| a.cmp(b))
        });
        names
    }

    /// Forward options to a registered matcher
    ///
    /// Returns false when the matcher is unknown or rejects the options.
    pub async fn configure_matcher(&self, name: &str, options: &MatcherOptions) -> bool {
        let matcher = self.matchers.read().await.get(name).cloned();
        match matcher {
            Some(matcher) => {
                let applied = matcher.configure(options);
                if !applied {
                    log::warn!("ORCHESTRATOR: Matcher {} rejected options {:?}", name, options);
                }
                applied
            }
            None => {
                log::warn!("ORCHESTRATOR: Cannot configure unknown matcher {}", name);
                false
            }
        }
    }

    /// Internal counters reported by each matcher
    pub async fn matcher_stats(&self) -> HashMap<String, MatcherStats> {
        self.matchers
            .read()
            .await
            .iter()
            .map(|(name, matcher)| (name.clone(), matcher.stats()))
            .collect()
    }

    /// Matchers able to handle the query, most preferred first
    pub async fn suitable_matchers(&self, query: &SearchQuery) -> Vec<Arc<dyn BookMatcher>> {
        let mut suitable: Vec<Arc<dyn BookMatcher>> = self
            .matchers
            .read()
            .await
            .values()
            .filter(|matcher| matcher.is_suitable_for_query(query))
            .cloned()
            .collect();
        suitable.sort_by(|a, b| {
            self.config
                .preference_rank(a.name())
                .cmp(&self.config.preference_rank(b.name()))
                .then_with(|| a.name().cmp(b.name()))
        });
        suitable
    }

    /// Search with the configured default strategy
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        self.search_with_strategy(query, self.config.default_strategy)
            .await
            .results
    }

    /// Search with an explicit strategy and report how it went
    pub async fn search_with_strategy(
        &self,
        query: &SearchQuery,
        strategy: SearchStrategy,
    ) -> SearchOutcome {
        let label = query.describe();
        let timer = TimedOperation::new(&format!("orchestrated search '{}'", label));
        LogContext::search_operation(&label, None, None);

        let suitable = self.suitable_matchers(query).await;
        let strategy = strategy.resolve(suitable.len());
        if suitable.is_empty() {
            log::info!("ORCHESTRATOR: No suitable matchers for '{}'", label);
            timer.finish_with_info("no suitable matchers");
            return SearchOutcome::empty(strategy);
        }
        log::debug!(
            "ORCHESTRATOR: {} suitable matchers, running {} strategy",
            suitable.len(),
            strategy
        );

        let query = Arc::new(query.clone());
        let runs = match strategy {
            // Resolved above; kept for exhaustiveness
            SearchStrategy::Auto | SearchStrategy::Parallel => {
                self.run_parallel(suitable, &query).await
            }
            SearchStrategy::Sequential => self.run_sequential(suitable, &query).await,
            SearchStrategy::BestMatch => self.run_best_match(suitable, &query).await,
            SearchStrategy::Adaptive => self.run_adaptive(suitable, &query).await,
        };

        let matchers_run: Vec<String> = runs.iter().map(|run| run.matcher.to_string()).collect();
        let raw: Vec<SearchResult> = runs.into_iter().flat_map(|run| run.results).collect();
        let (results, metrics) = self.combiner.combine(raw, self.config.max_results);

        LogContext::search_operation(&label, Some(strategy.as_str()), Some(results.len()));
        log::debug!("{}", metrics.report());
        timer.finish_with_info(&format!(
            "{} strategy, {} matchers, {} results",
            strategy,
            matchers_run.len(),
            results.len()
        ));

        SearchOutcome {
            results,
            strategy,
            matchers_run,
            metrics,
        }
    }

    /// Every matcher at once, collected in completion order
    async fn run_parallel(
        &self,
        matchers: Vec<Arc<dyn BookMatcher>>,
        query: &Arc<SearchQuery>,
    ) -> Vec<MatcherRun> {
        let mut pending: FuturesUnordered<_> = matchers
            .into_iter()
            .map(|matcher| self.run_matcher(matcher, Arc::clone(query)))
            .collect();

        let mut runs = Vec::new();
        while let Some(outcome) = pending.next().await {
            if let Some(run) = outcome {
                runs.push(run);
            }
        }
        runs
    }

    /// Preference order, stopping at the first convincing answer
    async fn run_sequential(
        &self,
        matchers: Vec<Arc<dyn BookMatcher>>,
        query: &Arc<SearchQuery>,
    ) -> Vec<MatcherRun> {
        let mut runs = Vec::new();
        for matcher in matchers {
            let Some(run) = self.run_matcher(matcher, Arc::clone(query)).await else {
                continue;
            };
            let top_score = run.top_score();
            let matcher = run.matcher;
            runs.push(run);

            if top_score >= self.config.sequential_short_circuit {
                log::debug!(
                    "ORCHESTRATOR: {} scored {:.3}, skipping remaining matchers",
                    matcher,
                    top_score
                );
                break;
            }
        }
        runs
    }

    async fn run_best_match(
        &self,
        matchers: Vec<Arc<dyn BookMatcher>>,
        query: &Arc<SearchQuery>,
    ) -> Vec<MatcherRun> {
        let Some(best) = matchers.into_iter().next() else {
            return Vec::new();
        };
        self.run_matcher(best, Arc::clone(query))
            .await
            .into_iter()
            .collect()
    }

    /// Best matcher alone, widening to a parallel run when it is unsure
    ///
    /// The first matcher's results are reused in the widened run rather
    /// than computed twice.
    async fn run_adaptive(
        &self,
        matchers: Vec<Arc<dyn BookMatcher>>,
        query: &Arc<SearchQuery>,
    ) -> Vec<MatcherRun> {
        let mut candidates = matchers.into_iter().take(self.config.adaptive_fanout);
        let Some(best) = candidates.next() else {
            return Vec::new();
        };

        let first = self.run_matcher(best, Arc::clone(query)).await;
        if let Some(run) = &first {
            if run.top_score() >= self.config.adaptive_threshold {
                log::debug!(
                    "ORCHESTRATOR: {} confident ({:.3}), not widening",
                    run.matcher,
                    run.top_score()
                );
                return first.into_iter().collect();
            }
        }

        let mut runs: Vec<MatcherRun> = first.into_iter().collect();
        runs.extend(self.run_parallel(candidates.collect(), query).await);
        runs
    }

    /// Run one matcher as an isolated, time-bounded task
    ///
    /// The matcher body runs on the blocking pool so that a matcher doing
    /// synchronous work cannot stall the timer. A run that overshoots the
    /// timeout is detached: its result is discarded and its worker permit
    /// is released immediately.
    async fn run_matcher(
        &self,
        matcher: Arc<dyn BookMatcher>,
        query: Arc<SearchQuery>,
    ) -> Option<MatcherRun> {
        let name = matcher.name();
        let task_timeout = self.config.task_timeout;
        let started = Instant::now();

        let permit = match Arc::clone(&self.workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.metrics.record_failure(name, started.elapsed()).await;
                LogContext::matcher_dropped(name, &format!("worker pool unavailable: {}", e));
                return None;
            }
        };

        let runtime = Handle::current();
        let run_started = Instant::now();
        let mut handle =
            tokio::task::spawn_blocking(move || runtime.block_on(matcher.search(&query)));

        let outcome = match timeout(task_timeout, &mut handle).await {
            Ok(Ok(results)) => Ok((results, run_started.elapsed())),
            Ok(Err(e)) => Err(AppError::MatcherException(format!("task aborted: {}", e))),
            Err(_) => {
                handle.abort();
                Err(AppError::MatcherTimeout(format!(
                    "no answer within {:?}",
                    task_timeout
                )))
            }
        };
        drop(permit);

        match outcome {
            Ok((results, elapsed)) => {
                self.metrics
                    .record_success(name, elapsed, results.len())
                    .await;
                log::debug!(
                    "ORCHESTRATOR: {} returned {} results in {}ms",
                    name,
                    results.len(),
                    elapsed.as_millis()
                );
                Some(MatcherRun {
                    matcher: name,
                    results,
                })
            }
            Err(AppError::MatcherTimeout(reason)) => {
                self.metrics.record_timeout(name, task_timeout).await;
                LogContext::matcher_dropped(name, &reason);
                None
            }
            Err(e) => {
                self.metrics.record_failure(name, started.elapsed()).await;
                LogContext::matcher_dropped(name, &e.to_string());
                None
            }
        }
    }
}
