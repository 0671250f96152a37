// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The robustness spine: circuit breaker, retry loop, and health checker
//! wired around every operation the pool and facade perform.

mod circuit_breaker;
mod classifier;
mod health;
mod retry;

pub use circuit_breaker::{BreakerState, CircuitBreaker, GateDecision};
pub use classifier::{DefaultErrorClassifier, ErrorClassifier};
pub use health::{HealthChecker, HealthSnapshot};
pub use retry::{Backoff, RetryPolicy};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, FailureKind};
use crate::logger::{Logger, TracingLogger};
use crate::metrics::{ConnectionSuccessMetrics, PerformanceMetrics};

/// Ties the circuit breaker, retry policy, error classifier, metrics
/// sinks, and logger together behind [`Spine::wrap_operation`].
///
/// One instance is typically shared (via `Arc`) across every call the
/// [`crate::facade::ClientFacade`] and [`crate::pool::ConnectionPool`]
/// make, so breaker state and metrics accumulate across the whole client.
pub struct Spine {
    breaker: CircuitBreaker,
    retry_policy: RetryPolicy,
    classifier: Box<dyn ErrorClassifier>,
    success_metrics: ConnectionSuccessMetrics,
    performance: Arc<PerformanceMetrics>,
    logger: Arc<dyn Logger>,
    health: HealthChecker,
}

impl Spine {
    /// Creates a spine with explicit dependencies. Prefer
    /// [`SpineBuilder`] for anything beyond defaults.
    #[must_use]
    pub fn new(
        breaker: CircuitBreaker,
        retry_policy: RetryPolicy,
        classifier: Box<dyn ErrorClassifier>,
        success_metrics: ConnectionSuccessMetrics,
        performance: Arc<PerformanceMetrics>,
        logger: Arc<dyn Logger>,
        health: HealthChecker,
    ) -> Self {
        Self {
            breaker,
            retry_policy,
            classifier,
            success_metrics,
            performance,
            logger,
            health,
        }
    }

    /// Runs `operation` under the full robustness treatment: circuit-breaker
    /// gate, retry loop with exponential backoff, failure accounting, and
    /// metrics/log reporting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`] if the breaker is open or a `HalfOpen`
    /// probe is already in flight. Otherwise returns the last error observed
    /// once retries are exhausted or a permanent failure is classified.
    pub async fn wrap_operation<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.breaker.gate(operation_name) {
            GateDecision::Reject => {
                self.logger.warn(
                    "circuit open, rejecting call",
                    &[("operation", &operation_name)],
                );
                return Err(Error::CircuitOpen(operation_name.to_string()));
            }
            GateDecision::Proceed | GateDecision::ProceedAsProbe => {}
        }

        let backoff = self.retry_policy.backoff_for(operation_name);
        let mut last_error = None;

        for attempt in 1..=backoff.max_retries.max(1) {
            let started = Instant::now();
            let outcome = operation().await;
            let elapsed = started.elapsed();
            self.performance.record(operation_name, elapsed);

            match outcome {
                Ok(value) => {
                    self.breaker.record_success(operation_name);
                    self.success_metrics.record(operation_name, true);
                    return Ok(value);
                }
                Err(error) => {
                    self.breaker.record_failure(operation_name);
                    self.success_metrics.record(operation_name, false);

                    let kind = self.classifier.classify(&error);
                    match kind {
                        FailureKind::Transient if attempt < backoff.max_retries => {
                            let delay = backoff.delay_for_attempt(attempt);
                            self.logger.info(
                                "retrying transient failure",
                                &[
                                    ("operation", &operation_name),
                                    ("attempt", &attempt),
                                    ("delay_ms", &delay.as_millis()),
                                ],
                            );
                            tokio::time::sleep(delay).await;
                            last_error = Some(error);
                        }
                        _ => return Err(error),
                    }
                }
            }
        }

        Err(last_error.unwrap_or(Error::Cancelled))
    }

    /// Computes a read-only health snapshot.
    #[must_use]
    pub fn health_snapshot(&self) -> HealthSnapshot {
        self.health.snapshot(&self.breaker, &self.performance)
    }

    /// The circuit breaker backing this spine, for callers that need
    /// direct state inspection (e.g. the facade choosing to skip a call).
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

/// Builds a [`Spine`] with sensible defaults, overridable piece by piece.
pub struct SpineBuilder {
    window_size: usize,
    failure_threshold: usize,
    cool_down: std::time::Duration,
    retry_policy: RetryPolicy,
    classifier: Box<dyn ErrorClassifier>,
    performance: Arc<PerformanceMetrics>,
    logger: Arc<dyn Logger>,
    min_healthy_rate: f64,
    memory_limit_bytes: u64,
    tracked_operations: Vec<String>,
}

impl SpineBuilder {
    /// Starts from the default breaker, retry policy, classifier, metrics,
    /// and logger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window_size: 100,
            failure_threshold: 5,
            cool_down: std::time::Duration::from_secs(60),
            retry_policy: RetryPolicy::default(),
            classifier: Box::new(DefaultErrorClassifier),
            performance: Arc::new(PerformanceMetrics::default()),
            logger: Arc::new(TracingLogger),
            min_healthy_rate: 0.95,
            memory_limit_bytes: u64::MAX,
            tracked_operations: Vec::new(),
        }
    }

    /// Sets the breaker's rolling window size.
    #[must_use]
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Sets the breaker's failure threshold (failures within the window
    /// that trip `Open`).
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the breaker's cool-down before allowing a `HalfOpen` probe.
    #[must_use]
    pub fn with_cool_down(mut self, cool_down: std::time::Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Overrides the error classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Shares an existing performance metrics sink instead of creating one.
    #[must_use]
    pub fn with_performance_metrics(mut self, performance: Arc<PerformanceMetrics>) -> Self {
        self.performance = performance;
        self
    }

    /// Overrides the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Sets the health checker's minimum healthy success rate.
    #[must_use]
    pub fn with_min_healthy_rate(mut self, rate: f64) -> Self {
        self.min_healthy_rate = rate;
        self
    }

    /// Sets the health checker's memory ceiling in bytes.
    #[must_use]
    pub fn with_memory_limit_bytes(mut self, limit: u64) -> Self {
        self.memory_limit_bytes = limit;
        self
    }

    /// Registers the operation names the health checker reports a
    /// per-operation success rate for.
    #[must_use]
    pub fn with_tracked_operations(mut self, operations: Vec<String>) -> Self {
        self.tracked_operations = operations;
        self
    }

    /// Builds the spine.
    #[must_use]
    pub fn build(self) -> Spine {
        Spine::new(
            CircuitBreaker::new(self.window_size, self.failure_threshold, self.cool_down),
            self.retry_policy,
            self.classifier,
            ConnectionSuccessMetrics::new(self.window_size),
            Arc::clone(&self.performance),
            self.logger,
            HealthChecker::new(
                self.min_healthy_rate,
                self.memory_limit_bytes,
                self.tracked_operations,
            ),
        )
    }
}

impl Default for SpineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
