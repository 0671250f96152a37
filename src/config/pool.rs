// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pool sizing and timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration governing how a [`crate::pool::ConnectionPool`] sizes
/// itself and how long callers wait for a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Minimum connections to keep alive once any have been created.
    pub min_connections: u32,
    /// Hard cap on concurrently live connections.
    pub max_connections: u32,
    /// How long an idle connection may sit before being eligible for
    /// reclamation.
    #[serde(with = "duration_millis")]
    pub max_idle_time: Duration,
    /// How long `get` blocks when the pool is at capacity before failing
    /// with `PoolExhausted`.
    #[serde(with = "duration_millis")]
    pub wait_timeout: Duration,
}

impl PoolConfig {
    /// Creates a pool configuration with the given bounds and default
    /// timeouts (`max_idle_time` 5 minutes, `wait_timeout` 10 seconds).
    #[must_use]
    pub fn new(min_connections: u32, max_connections: u32) -> Self {
        Self {
            min_connections,
            max_connections,
            max_idle_time: Duration::from_secs(300),
            wait_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the idle-time ceiling.
    #[must_use]
    pub fn with_max_idle_time(mut self, duration: Duration) -> Self {
        self.max_idle_time = duration;
        self
    }

    /// Sets the wait timeout for `get` under contention.
    #[must_use]
    pub fn with_wait_timeout(mut self, duration: Duration) -> Self {
        self.wait_timeout = duration;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        #[allow(clippy::cast_possible_truncation)]
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_bounds_and_defaults() {
        let config = PoolConfig::new(2, 8);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.wait_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_overrides_timeouts() {
        let config = PoolConfig::new(0, 4)
            .with_wait_timeout(Duration::from_millis(100))
            .with_max_idle_time(Duration::from_secs(60));
        assert_eq!(config.wait_timeout, Duration::from_millis(100));
        assert_eq!(config.max_idle_time, Duration::from_secs(60));
    }

    #[test]
    fn default_allows_zero_minimum() {
        let config = PoolConfig::default();
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.max_connections, 10);
    }
}
