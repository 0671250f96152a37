// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A bounded MQTT 5 connection pool wrapped in a retry/circuit-breaker
//! robustness spine, with a topic parser/validator for the wire-level
//! quirks brokers actually need (shared subscriptions, non-standard queue
//! subscriptions, wildcard filters).
//!
//! # Modules
//!
//! - [`topic`] — parsing, validation, and matching for MQTT topics and
//!   filters, including `$share/` and `$queue/` prefixes.
//! - [`config`] — connection and pool configuration records, plus the
//!   validator that enforces their invariants.
//! - [`metrics`] — validation, performance, and connection-success sinks.
//! - [`spine`] — the circuit breaker, retry policy, and health checker.
//! - [`pool`] — the bounded connection pool and its `ConnectionFactory`
//!   abstraction.
//! - [`facade`] — the five public MQTT operations, wired through the spine.
//!
//! # Feature Flags
//!
//! - `mqtt` (default) — enables [`pool::RumqttcFactory`], a
//!   [`pool::ConnectionFactory`] backed by `rumqttc`.
//! - `memory-sampler` — enables a `/proc/self/statm`-backed memory sampler
//!   for [`metrics::PerformanceMetrics`] on Linux.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use mqtt_resilient_pool::config::{ConnectionConfig, PoolConfig};
//! use mqtt_resilient_pool::facade::ClientFacade;
//! use mqtt_resilient_pool::pool::{ConnectionPool, RumqttcFactory};
//! use mqtt_resilient_pool::spine::SpineBuilder;
//! use mqtt_resilient_pool::topic::Qos;
//!
//! # async fn example() -> mqtt_resilient_pool::Result<()> {
//! let factory = Arc::new(RumqttcFactory::new(Duration::from_secs(5)));
//! let pool = Arc::new(ConnectionPool::new(
//!     "default",
//!     ConnectionConfig::new("broker.local", 1883),
//!     PoolConfig::new(1, 8),
//!     factory,
//! ));
//! let spine = Arc::new(SpineBuilder::new().build());
//! let client = ClientFacade::new(pool, spine);
//!
//! client
//!     .publish("sensors/room1/temp", b"21.5", Qos::AtLeastOnce, false, false, Default::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod logger;
pub mod metrics;
pub mod pool;
pub mod spine;
pub mod topic;

pub use error::{Error, Result};
pub use logger::{Logger, NoopLogger, TracingLogger};
