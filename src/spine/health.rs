// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only health snapshots computed from the breaker's and metrics'
//! shared state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::metrics::PerformanceMetrics;
use crate::spine::circuit_breaker::CircuitBreaker;

/// A point-in-time read of the spine's health. Never mutates state.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// True iff overall success rate is at or above `min_healthy_rate` and
    /// memory usage is below its limit.
    pub is_healthy: bool,
    /// Success rate per operation name, from the same rolling window the
    /// circuit breaker uses.
    pub success_rate_by_operation: HashMap<String, f64>,
    /// Current resident memory usage in bytes, if the sampler can report one.
    pub memory_usage_bytes: u64,
    /// Configured memory ceiling in bytes.
    pub memory_limit_bytes: u64,
    /// Wall-clock time since the spine was constructed.
    #[serde(with = "duration_secs")]
    pub uptime: Duration,
    /// Wall-clock time the snapshot was computed, for callers exporting or
    /// logging snapshots alongside other timestamped data.
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

/// Computes [`HealthSnapshot`]s on demand from a breaker and performance
/// metrics sink. Holds no mutable state of its own beyond the start time
/// used for uptime.
pub struct HealthChecker {
    started_at: Instant,
    min_healthy_rate: f64,
    memory_limit_bytes: u64,
    tracked_operations: Vec<String>,
}

impl HealthChecker {
    /// Creates a checker whose uptime clock starts now.
    #[must_use]
    pub fn new(min_healthy_rate: f64, memory_limit_bytes: u64, tracked_operations: Vec<String>) -> Self {
        Self {
            started_at: Instant::now(),
            min_healthy_rate,
            memory_limit_bytes,
            tracked_operations,
        }
    }

    /// Computes a health snapshot from the given breaker and performance
    /// metrics.
    #[must_use]
    pub fn snapshot(
        &self,
        breaker: &CircuitBreaker,
        performance: &PerformanceMetrics,
    ) -> HealthSnapshot {
        let success_rate_by_operation: HashMap<String, f64> = self
            .tracked_operations
            .iter()
            .map(|name| (name.clone(), breaker.success_rate(name)))
            .collect();

        let overall_rate = if success_rate_by_operation.is_empty() {
            1.0
        } else {
            success_rate_by_operation.values().sum::<f64>()
                / success_rate_by_operation.len() as f64
        };

        let memory_usage_bytes = performance.memory_high_water();
        let is_healthy =
            overall_rate >= self.min_healthy_rate && memory_usage_bytes < self.memory_limit_bytes;

        HealthSnapshot {
            is_healthy,
            success_rate_by_operation,
            memory_usage_bytes,
            memory_limit_bytes: self.memory_limit_bytes,
            uptime: self.started_at.elapsed(),
            checked_at: chrono::Utc::now(),
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(0.95, u64::MAX, Vec::new())
    }
}
