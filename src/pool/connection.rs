// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The connection lifecycle and the trait a live MQTT connection must
//! implement to be poolable.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ConnectionError;
use crate::topic::Qos;

/// Lifecycle state of a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed but not yet connecting.
    New,
    /// Handshake in flight.
    Connecting,
    /// Ready to serve operations.
    Connected,
    /// Shutting down; no new operations accepted.
    Closing,
    /// Fully torn down.
    Closed,
    /// The connection failed in a way that makes it unfit for reuse; the
    /// pool discards rather than recycles it.
    Failed,
}

/// A decoded message delivered by [`MqttConnection::receive`].
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The wire topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
    /// Quality of service the message was delivered at.
    pub qos: Qos,
    /// Whether the broker marked this as a retained message.
    pub retain: bool,
    /// Whether the broker marked this as a duplicate delivery.
    pub dup: bool,
    /// Opaque MQTT 5 user/protocol properties attached to the message.
    pub properties: Map<String, Value>,
}

/// One live connection to a broker.
///
/// Implementations own their protocol I/O exclusively; the pool guarantees
/// at most one borrower holds a given connection at a time, so no internal
/// locking is required here.
#[async_trait]
pub trait MqttConnection: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Whether the connection is usable for new operations.
    fn is_alive(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Sends a PUBLISH.
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        dup: bool,
        retain: bool,
        properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError>;

    /// Sends one SUBSCRIBE per entry in `topics`.
    async fn subscribe(
        &self,
        topics: &std::collections::HashMap<String, Map<String, Value>>,
        properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError>;

    /// Sends one UNSUBSCRIBE per entry in `topics`.
    async fn unsubscribe(
        &self,
        topics: &std::collections::HashMap<String, Map<String, Value>>,
        properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError>;

    /// Blocks until one message arrives.
    async fn receive(&self) -> Result<Message, ConnectionError>;

    /// Tears the connection down. Idempotent.
    async fn close(&self) -> Result<(), ConnectionError>;
}
