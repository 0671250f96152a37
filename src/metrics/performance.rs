// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation call counters, latency accumulators, and a pluggable
//! memory high-water sampler.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};

/// Source of a point-in-time process memory reading, in bytes.
///
/// Abstracted so the default build stays dependency-free and portable;
/// [`ProcSelfStatmSampler`] is only compiled in behind the
/// `memory-sampler` feature.
pub trait MemorySampler: Send + Sync {
    /// Returns the current resident memory usage in bytes, or `None` if it
    /// cannot be determined on this platform.
    fn sample(&self) -> Option<u64>;
}

/// A sampler that never reports a reading. The default.
#[derive(Debug, Default)]
pub struct NoopMemorySampler;

impl MemorySampler for NoopMemorySampler {
    fn sample(&self) -> Option<u64> {
        None
    }
}

/// Reads resident set size from `/proc/self/statm` on Linux.
#[cfg(feature = "memory-sampler")]
#[derive(Debug, Default)]
pub struct ProcSelfStatmSampler;

#[cfg(feature = "memory-sampler")]
impl MemorySampler for ProcSelfStatmSampler {
    fn sample(&self) -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = contents.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096u64;
        Some(resident_pages * page_size)
    }
}

#[derive(Debug, Default, Clone)]
struct OperationStats {
    calls: u64,
    cumulative: Duration,
    min: Option<Duration>,
    max: Option<Duration>,
}

struct Inner {
    by_operation: Mutex<HashMap<String, OperationStats>>,
    memory_high_water: Mutex<u64>,
    sampler: Box<dyn MemorySampler>,
}

/// Call-count, latency, and memory-high-water tracking, keyed by operation
/// name (`"publish"`, `"subscribe"`, and so on).
pub struct PerformanceMetrics {
    inner: Inner,
}

impl PerformanceMetrics {
    /// Creates a metrics sink with the given memory sampler. Use
    /// [`Self::default`] for a sampler-free instance.
    #[must_use]
    pub fn with_sampler(sampler: Box<dyn MemorySampler>) -> Self {
        Self {
            inner: Inner {
                by_operation: Mutex::new(HashMap::new()),
                memory_high_water: Mutex::new(0),
                sampler,
            },
        }
    }

    /// Records one completed call to `operation` taking `elapsed`.
    pub fn record(&self, operation: &str, elapsed: Duration) {
        let mut by_operation = self.inner.by_operation.lock();
        let stats = by_operation.entry(operation.to_string()).or_default();
        stats.calls += 1;
        stats.cumulative += elapsed;
        stats.min = Some(stats.min.map_or(elapsed, |min| min.min(elapsed)));
        stats.max = Some(stats.max.map_or(elapsed, |max| max.max(elapsed)));
        drop(by_operation);

        if let Some(sample) = self.inner.sampler.sample() {
            let mut high_water = self.inner.memory_high_water.lock();
            if sample > *high_water {
                *high_water = sample;
            }
        }
    }

    /// Mean latency for `operation`, or `None` if it has never been
    /// recorded.
    #[must_use]
    pub fn mean_latency(&self, operation: &str) -> Option<Duration> {
        let by_operation = self.inner.by_operation.lock();
        let stats = by_operation.get(operation)?;
        if stats.calls == 0 {
            None
        } else {
            Some(stats.cumulative / u32::try_from(stats.calls).unwrap_or(u32::MAX))
        }
    }

    /// Highest memory sample observed across the metrics sink's lifetime,
    /// in bytes. Zero if the sampler never produced a reading.
    #[must_use]
    pub fn memory_high_water(&self) -> u64 {
        *self.inner.memory_high_water.lock()
    }

    /// A point-in-time snapshot suitable for exposition or logging.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn snapshot(&self) -> Value {
        let by_operation = self.inner.by_operation.lock();
        let operations: Value = by_operation
            .iter()
            .map(|(name, stats)| {
                (
                    name.clone(),
                    json!({
                        "calls": stats.calls,
                        "cumulative_ms": stats.cumulative.as_millis() as u64,
                        "min_ms": stats.min.map(|d| d.as_millis() as u64),
                        "max_ms": stats.max.map(|d| d.as_millis() as u64),
                    }),
                )
            })
            .collect();
        drop(by_operation);

        json!({
            "operations": operations,
            "memory_high_water_bytes": self.memory_high_water(),
        })
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::with_sampler(Box::new(NoopMemorySampler))
    }
}
