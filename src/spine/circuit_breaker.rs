// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation circuit breaker: Closed, Open, HalfOpen.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::metrics::OutcomeWindow;

/// Breaker state for one operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through.
    Closed,
    /// Calls fail fast with `CircuitOpen` until the cool-down elapses.
    Open,
    /// Cool-down elapsed; exactly one probe call is allowed through.
    HalfOpen,
}

struct OperationState {
    state: BreakerState,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl OperationState {
    fn new(window_size: usize) -> Self {
        Self {
            state: BreakerState::Closed,
            window: OutcomeWindow::new(window_size),
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// What the caller should do before invoking the wrapped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Proceed normally.
    Proceed,
    /// Proceed as the single allowed `HalfOpen` probe.
    ProceedAsProbe,
    /// Fail immediately without invoking the operation.
    Reject,
}

/// Tracks breaker state per operation name and decides whether a call may
/// proceed.
///
/// `HalfOpen` concurrency is handled by rejection, not queuing: once the
/// cool-down elapses, the first caller through becomes the probe and any
/// concurrent caller is turned away with [`GateDecision::Reject`] until the
/// probe resolves.
pub struct CircuitBreaker {
    window_size: usize,
    failure_threshold: usize,
    cool_down: Duration,
    operations: Mutex<HashMap<String, OperationState>>,
}

impl CircuitBreaker {
    /// Creates a breaker with the given rolling window size, failure
    /// threshold (failures within the window that trip `Open`), and
    /// cool-down before a probe is allowed.
    #[must_use]
    pub fn new(window_size: usize, failure_threshold: usize, cool_down: Duration) -> Self {
        Self {
            window_size,
            failure_threshold,
            cool_down,
            operations: Mutex::new(HashMap::new()),
        }
    }

    /// Decides whether a call for `operation` may proceed right now,
    /// transitioning `Open -> HalfOpen` if the cool-down has elapsed.
    pub fn gate(&self, operation: &str) -> GateDecision {
        let mut operations = self.operations.lock();
        let state = operations
            .entry(operation.to_string())
            .or_insert_with(|| OperationState::new(self.window_size));

        match state.state {
            BreakerState::Closed => GateDecision::Proceed,
            BreakerState::Open => {
                let elapsed = state.opened_at.map_or(Duration::ZERO, |at| at.elapsed());
                if elapsed >= self.cool_down {
                    state.state = BreakerState::HalfOpen;
                    state.probe_in_flight = true;
                    GateDecision::ProceedAsProbe
                } else {
                    GateDecision::Reject
                }
            }
            BreakerState::HalfOpen => {
                if state.probe_in_flight {
                    GateDecision::Reject
                } else {
                    state.probe_in_flight = true;
                    GateDecision::ProceedAsProbe
                }
            }
        }
    }

    /// Records a successful attempt, closing the breaker if it was
    /// `HalfOpen`.
    pub fn record_success(&self, operation: &str) {
        let mut operations = self.operations.lock();
        let state = operations
            .entry(operation.to_string())
            .or_insert_with(|| OperationState::new(self.window_size));
        state.window.record(true);
        state.state = BreakerState::Closed;
        state.opened_at = None;
        state.probe_in_flight = false;
    }

    /// Records a failed attempt, tripping the breaker open if the rolling
    /// window now shows at least `failure_threshold` failures, or
    /// reopening immediately if a `HalfOpen` probe failed.
    pub fn record_failure(&self, operation: &str) {
        let mut operations = self.operations.lock();
        let state = operations
            .entry(operation.to_string())
            .or_insert_with(|| OperationState::new(self.window_size));
        state.window.record(false);
        state.probe_in_flight = false;

        if state.state == BreakerState::HalfOpen
            || state.window.failures() >= self.failure_threshold
        {
            state.state = BreakerState::Open;
            state.opened_at = Some(Instant::now());
        }
    }

    /// Current state for `operation`, defaulting to `Closed` if never seen.
    #[must_use]
    pub fn state(&self, operation: &str) -> BreakerState {
        self.operations
            .lock()
            .get(operation)
            .map_or(BreakerState::Closed, |state| state.state)
    }

    /// Current rolling success rate for `operation`, `1.0` if unseen.
    #[must_use]
    pub fn success_rate(&self, operation: &str) -> f64 {
        self.operations
            .lock()
            .get(operation)
            .map_or(1.0, |state| state.window.success_rate())
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(10, 5, Duration::from_secs(60))
    }
}
