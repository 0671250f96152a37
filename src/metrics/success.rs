// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation connection success-rate tracking, independent of (but
//! structurally identical to) the circuit breaker's own rolling window.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::metrics::window::{OutcomeWindow, DEFAULT_WINDOW_SIZE};

/// Tracks success/failure per operation name over a rolling window,
/// exposed independently of the circuit breaker so dashboards and the
/// health checker can read it without coupling to breaker internals.
pub struct ConnectionSuccessMetrics {
    window_size: usize,
    by_operation: Mutex<HashMap<String, OutcomeWindow>>,
}

impl ConnectionSuccessMetrics {
    /// Creates a sink using `window_size` outcomes per operation.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            by_operation: Mutex::new(HashMap::new()),
        }
    }

    /// Records one attempt's outcome for `operation`.
    pub fn record(&self, operation: &str, success: bool) {
        let mut by_operation = self.by_operation.lock();
        by_operation
            .entry(operation.to_string())
            .or_insert_with(|| OutcomeWindow::new(self.window_size))
            .record(success);
    }

    /// Success rate for `operation` in `[0.0, 1.0]`, `1.0` if unseen.
    #[must_use]
    pub fn success_rate(&self, operation: &str) -> f64 {
        self.by_operation
            .lock()
            .get(operation)
            .map_or(1.0, OutcomeWindow::success_rate)
    }

    /// A point-in-time snapshot suitable for exposition or logging.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let by_operation = self.by_operation.lock();
        by_operation
            .iter()
            .map(|(name, window)| {
                (
                    name.clone(),
                    json!({
                        "success_rate": window.success_rate(),
                        "samples": window.len(),
                    }),
                )
            })
            .collect()
    }
}

impl Default for ConnectionSuccessMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
