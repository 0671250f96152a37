// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Counters and a bounded error log for [`crate::config::ConfigValidator`].

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::{json, Value};

/// The kinds of configuration the validator records outcomes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// A [`crate::config::ConnectionConfig`].
    ConnectionConfig,
    /// A [`crate::topic::TopicConfig`].
    TopicConfig,
    /// A [`crate::config::PoolConfig`].
    PoolConfig,
    /// A bare topic filter string.
    TopicFilter,
}

impl ValidationKind {
    fn as_str(self) -> &'static str {
        match self {
            ValidationKind::ConnectionConfig => "connection_config",
            ValidationKind::TopicConfig => "topic_config",
            ValidationKind::PoolConfig => "pool_config",
            ValidationKind::TopicFilter => "topic_filter",
        }
    }
}

const MAX_RECENT_ERRORS: usize = 100;

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    successful: u64,
    failed: u64,
}

struct Inner {
    by_kind: Mutex<std::collections::HashMap<&'static str, Counters>>,
    recent_errors: Mutex<VecDeque<String>>,
}

/// Records the outcome of every configuration validation, broken down by
/// kind, plus a bounded ring buffer of the most recent failure messages.
///
/// Shared via `Arc` across every [`crate::config::ConfigValidator`] instance
/// that should report into the same sink.
pub struct ValidationMetrics {
    inner: Inner,
}

impl ValidationMetrics {
    /// Creates an empty metrics sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Inner {
                by_kind: Mutex::new(std::collections::HashMap::new()),
                recent_errors: Mutex::new(VecDeque::with_capacity(MAX_RECENT_ERRORS)),
            },
        }
    }

    /// Records a successful validation of `kind`.
    pub fn record_success(&self, kind: ValidationKind) {
        let mut by_kind = self.inner.by_kind.lock();
        let counters = by_kind.entry(kind.as_str()).or_default();
        counters.total += 1;
        counters.successful += 1;
    }

    /// Records a failed validation of `kind`, pushing `message` into the
    /// bounded recent-errors buffer (oldest evicted once full).
    pub fn record_failure(&self, kind: ValidationKind, message: impl Into<String>) {
        let mut by_kind = self.inner.by_kind.lock();
        let counters = by_kind.entry(kind.as_str()).or_default();
        counters.total += 1;
        counters.failed += 1;
        drop(by_kind);

        let mut recent = self.inner.recent_errors.lock();
        if recent.len() >= MAX_RECENT_ERRORS {
            recent.pop_front();
        }
        recent.push_back(message.into());
    }

    /// Success rate for `kind` in `[0.0, 1.0]`, or `1.0` if never recorded.
    #[must_use]
    pub fn success_rate(&self, kind: ValidationKind) -> f64 {
        let by_kind = self.inner.by_kind.lock();
        by_kind.get(kind.as_str()).map_or(1.0, |counters| {
            if counters.total == 0 {
                1.0
            } else {
                f64::from(u32::try_from(counters.successful).unwrap_or(u32::MAX))
                    / f64::from(u32::try_from(counters.total).unwrap_or(u32::MAX))
            }
        })
    }

    /// A point-in-time snapshot suitable for exposition or logging.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let by_kind = self.inner.by_kind.lock();
        let kinds: Value = by_kind
            .iter()
            .map(|(kind, counters)| {
                (
                    (*kind).to_string(),
                    json!({
                        "total": counters.total,
                        "successful": counters.successful,
                        "failed": counters.failed,
                    }),
                )
            })
            .collect();
        drop(by_kind);

        let recent_errors: Vec<String> =
            self.inner.recent_errors.lock().iter().cloned().collect();
        json!({
            "by_kind": kinds,
            "recent_errors": recent_errors,
        })
    }
}

impl Default for ValidationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
