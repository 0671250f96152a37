// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the pool, topic parser, and robustness spine.
//!
//! This module provides the error hierarchy shared across the crate: a single
//! top-level [`Error`] that every public operation returns, plus a taxonomy of
//! [`FailureKind`] used internally to decide whether an error is worth retrying.

use thiserror::Error;

/// The main error type returned by every public operation in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied configuration violated an invariant.
    ///
    /// The message aggregates every violation found in a single validation
    /// pass; validators never short-circuit on the first failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller invoked an operation name the facade does not support.
    #[error("unsupported operation: {0}")]
    InvalidMethod(String),

    /// The pool handed out something that was not a live connection.
    ///
    /// This should not happen in practice; it is a defensive check against a
    /// misbehaving connection factory.
    #[error("pool returned a connection that is not live")]
    InvalidMqttConnection,

    /// `get` waited `wait_timeout` with no connection becoming available.
    #[error("connection pool exhausted after waiting {wait_ms} ms")]
    PoolExhausted {
        /// How long the caller waited before giving up.
        wait_ms: u64,
    },

    /// A transient failure (network drop, timeout, broker busy). Retried by
    /// the robustness spine up to `max_retries` before being surfaced.
    #[error("transient failure: {0}")]
    Transient(String),

    /// A permanent failure (bad credentials, unauthorized topic, malformed
    /// packet). Never retried.
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// The circuit breaker for this operation is open; the call fast-failed
    /// without invoking the underlying connection.
    #[error("circuit open for operation {0}")]
    CircuitOpen(String),

    /// The caller cancelled the operation or its deadline expired.
    #[error("operation cancelled")]
    Cancelled,

    /// The underlying connection factory failed to connect, publish,
    /// subscribe, or otherwise communicate with the broker.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
}

impl Error {
    /// Classifies this error into the retry taxonomy used by the robustness
    /// spine.
    ///
    /// `Transient`/`Permanent` pass through unchanged, `CircuitOpen` and
    /// `Cancelled` never retry, and a raw [`ConnectionError`] is classified
    /// via [`ConnectionError::is_transient`].
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Transient(_) => FailureKind::Transient,
            Error::Permanent(_)
            | Error::InvalidConfig(_)
            | Error::InvalidMethod(_)
            | Error::InvalidMqttConnection
            | Error::PoolExhausted { .. } => FailureKind::Permanent,
            Error::CircuitOpen(_) => FailureKind::CircuitOpen,
            Error::Cancelled => FailureKind::Cancelled,
            Error::Connection(e) => {
                if e.is_transient() {
                    FailureKind::Transient
                } else {
                    FailureKind::Permanent
                }
            }
        }
    }
}

/// Errors raised by a connection factory or live connection implementation.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connecting to the broker failed.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The operation timed out waiting on the wire.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// The broker rejected the request for a reason unrelated to the network
    /// (bad credentials, unauthorized topic, malformed packet).
    #[error("rejected by broker: {0}")]
    Rejected(String),

    /// The underlying MQTT client reported an error.
    #[cfg(feature = "mqtt")]
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The connection's event loop terminated unexpectedly.
    #[error("connection closed: {0}")]
    Closed(String),
}

impl ConnectionError {
    /// Whether this error represents a transient, retry-worthy condition.
    ///
    /// Timeouts and connect failures are transient; anything the broker
    /// explicitly rejected is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectionError::ConnectFailed(_) | ConnectionError::Timeout(_) => true,
            ConnectionError::Rejected(_) | ConnectionError::Closed(_) => false,
            #[cfg(feature = "mqtt")]
            ConnectionError::Mqtt(_) => true,
        }
    }
}

/// Classification used by the robustness spine to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth retrying (network drop, timeout, broker busy).
    Transient,
    /// Not worth retrying (bad credentials, invalid topic, protocol violation).
    Permanent,
    /// Raised by a nested circuit breaker; never retried.
    CircuitOpen,
    /// The caller cancelled or the deadline expired; never retried.
    Cancelled,
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
