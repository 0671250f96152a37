// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exponential backoff parameters, globally and per operation name.

use std::collections::HashMap;
use std::time::Duration;

/// Backoff parameters for one operation (or the global default).
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Maximum number of attempts, including the first.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling the exponential backoff never exceeds.
    pub max_delay: Duration,
}

impl Backoff {
    /// Delay before retry attempt number `attempt` (1-indexed), capped at
    /// `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let scaled = self.base_delay.saturating_mul(1u32.checked_shl(exponent).unwrap_or(u32::MAX));
        scaled.min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Resolves the [`Backoff`] to use for a given operation name, falling back
/// to a global default when no override is registered.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    default: Backoff,
    overrides: HashMap<String, Backoff>,
}

impl RetryPolicy {
    /// Creates a policy using `default` for every operation not otherwise
    /// overridden.
    #[must_use]
    pub fn new(default: Backoff) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Overrides backoff parameters for a specific operation name.
    #[must_use]
    pub fn with_override(mut self, operation: impl Into<String>, backoff: Backoff) -> Self {
        self.overrides.insert(operation.into(), backoff);
        self
    }

    /// Resolves the backoff to use for `operation`.
    #[must_use]
    pub fn backoff_for(&self, operation: &str) -> Backoff {
        self.overrides.get(operation).copied().unwrap_or(self.default)
    }
}
