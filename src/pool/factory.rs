// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The one external dependency the core must consume: something that can
//! turn a [`ConnectionConfig`] into a live [`MqttConnection`].

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::ConnectionError;
use crate::pool::connection::MqttConnection;

/// Produces live connections for a [`crate::pool::ConnectionPool`].
///
/// Implementations are expected to be cheap to clone or otherwise shared
/// (the pool holds one factory for its whole lifetime); the `rumqttc`-backed
/// implementation behind the `mqtt` feature wires up an
/// `AsyncClient`/`EventLoop` pair per connection, the same way
/// `tasmor_lib::protocol::mqtt_broker` establishes a broker session.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Establishes a new connection.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn MqttConnection>, ConnectionError>;
}
