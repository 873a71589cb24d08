use log::{debug, error, info, warn};
use std::sync::Once;

use crate::shared::errors::AppError;

static INIT: Once = Once::new();

/// Initialize the logging system
/// This should be called once by the embedding application
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info) // Default level
            .filter_module("bookmatch", log::LevelFilter::Debug) // More verbose for our crate
            .filter_module("tokio", log::LevelFilter::Warn) // Reduce tokio noise
            .format_timestamp_secs()
            .format_target(false)
            .format_module_path(false)
            .try_init();

        info!("Logging system initialized");
    });
}

/// Structured logging helpers for common patterns
pub struct LogContext;

impl LogContext {
    /// Log search operations
    pub fn search_operation(query: &str, matcher: Option<&str>, results: Option<usize>) {
        match (matcher, results) {
            (Some(m), Some(r)) => info!("Search: '{}' via {} returned {} results", query, m, r),
            (Some(m), None) => debug!("Search: Starting '{}' via {}", query, m),
            (None, Some(r)) => info!("Search: '{}' returned {} results", query, r),
            (None, None) => debug!("Search: Starting '{}'", query),
        }
    }

    /// Log a matcher task that was dropped from a search
    pub fn matcher_dropped(matcher: &str, reason: &str) {
        warn!("Matcher {} dropped from search: {}", matcher, reason);
    }

    /// Log cache operations
    pub fn cache_operation(tier: &str, operation: &str, key: &str, hit: Option<bool>) {
        match hit {
            Some(true) => debug!("Cache[{}]: {} HIT for {}", tier, operation, key),
            Some(false) => debug!("Cache[{}]: {} MISS for {}", tier, operation, key),
            None => debug!("Cache[{}]: {} {}", tier, operation, key),
        }
    }

    /// Log errors with context; degraded-but-recoverable errors are warnings
    pub fn error_with_context(error: &AppError, context: &str) {
        if error.is_recoverable() {
            warn!("{}: {}", context, error);
        } else {
            error!("{}: {}", context, error);
        }
    }

    /// Log performance metrics
    pub fn performance_metric(operation: &str, duration_ms: u64, additional_info: Option<&str>) {
        match additional_info {
            Some(info) => info!(
                "Performance: {} took {}ms ({})",
                operation, duration_ms, info
            ),
            None => info!("Performance: {} took {}ms", operation, duration_ms),
        }
    }
}

/// Helper for timing operations
pub struct TimedOperation {
    start: std::time::Instant,
    operation: String,
}

impl TimedOperation {
    pub fn new(operation: &str) -> Self {
        debug!("Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation: operation.to_string(),
        }
    }

    pub fn finish_with_info(self, info: &str) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::performance_metric(&self.operation, duration, Some(info));
        duration
    }
}
