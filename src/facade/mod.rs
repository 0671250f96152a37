// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public surface: five MQTT operations, wrapped in the robustness
//! spine and backed by a named, pooled connection.

mod operation;

pub use operation::Operation;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::pool::{ConnectionPool, ContextStore, Message, MqttConnection, NoopContextStore};
use crate::spine::Spine;
use crate::topic::Qos;

/// A borrowed connection, either freshly taken from the pool (released on
/// drop via an explicit `put`) or held by the caller's execution context
/// (never released by the facade — the context's own lifecycle owns it).
enum Handle {
    Pooled(Box<dyn MqttConnection>),
    Context(Arc<dyn MqttConnection>),
}

impl Handle {
    fn as_connection(&self) -> &dyn MqttConnection {
        match self {
            Handle::Pooled(conn) => conn.as_ref(),
            Handle::Context(conn) => conn.as_ref(),
        }
    }
}

/// The default pool name used when a facade is constructed without an
/// explicit one.
pub const DEFAULT_POOL_NAME: &str = "default";

/// Validates an operation name, resolves a connection (context affinity or
/// a fresh pool borrow), runs it through the robustness spine, and releases
/// the connection unless the context owns its lifecycle.
pub struct ClientFacade {
    pool_name: String,
    pool: Arc<ConnectionPool>,
    spine: Arc<Spine>,
    context: Arc<dyn ContextStore>,
}

impl ClientFacade {
    /// Creates a facade over `pool`, reporting through `spine`, with no
    /// request-scoped affinity (every call borrows and returns).
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>, spine: Arc<Spine>) -> Self {
        Self {
            pool_name: DEFAULT_POOL_NAME.to_string(),
            pool,
            spine,
            context: Arc::new(NoopContextStore),
        }
    }

    /// Sets the pool name this facade is parametrized by.
    #[must_use]
    pub fn with_pool_name(mut self, name: impl Into<String>) -> Self {
        self.pool_name = name.into();
        self
    }

    /// Sets the context store used for request-scoped affinity.
    #[must_use]
    pub fn with_context_store(mut self, context: Arc<dyn ContextStore>) -> Self {
        self.context = context;
        self
    }

    async fn resolve(&self) -> Result<Handle, Error> {
        if self.context.has(&self.pool_name) {
            let conn = self
                .context
                .get(&self.pool_name)
                .ok_or(Error::InvalidMqttConnection)?;
            Ok(Handle::Context(conn))
        } else {
            Ok(Handle::Pooled(self.pool.get().await?))
        }
    }

    async fn release(&self, handle: Handle) {
        if let Handle::Pooled(conn) = handle {
            self.pool.put(conn).await;
        }
    }

    /// Sends a PUBLISH.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`], [`Error::CircuitOpen`], or a
    /// propagated connection error.
    #[allow(clippy::too_many_arguments)]
    pub async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        dup: bool,
        retain: bool,
        properties: Map<String, Value>,
    ) -> Result<(), Error> {
        let handle = self.resolve().await?;
        let conn = handle.as_connection();
        let result = self
            .spine
            .wrap_operation(Operation::Publish.wrap_name(), || async {
                conn.publish(topic, payload, qos, dup, retain, &properties)
                    .await
                    .map_err(Error::Connection)
            })
            .await;
        self.release(handle).await;
        result
    }

    /// Sends one SUBSCRIBE per entry in `topics`. Each entry's properties
    /// must contain a `qos` field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `topics` is empty, or a
    /// propagated connection/breaker/pool error.
    pub async fn subscribe(
        &self,
        topics: HashMap<String, Map<String, Value>>,
        properties: Map<String, Value>,
    ) -> Result<(), Error> {
        require_qos_present(&topics)?;
        let handle = self.resolve().await?;
        let conn = handle.as_connection();
        let result = self
            .spine
            .wrap_operation(Operation::Subscribe.wrap_name(), || async {
                conn.subscribe(&topics, &properties)
                    .await
                    .map_err(Error::Connection)
            })
            .await;
        self.release(handle).await;
        result
    }

    /// Sends one UNSUBSCRIBE per entry in `topics`.
    ///
    /// # Errors
    ///
    /// Returns a propagated connection/breaker/pool error.
    pub async fn unsubscribe(
        &self,
        topics: HashMap<String, Map<String, Value>>,
        properties: Map<String, Value>,
    ) -> Result<(), Error> {
        let handle = self.resolve().await?;
        let conn = handle.as_connection();
        let result = self
            .spine
            .wrap_operation(Operation::Unsubscribe.wrap_name(), || async {
                conn.unsubscribe(&topics, &properties)
                    .await
                    .map_err(Error::Connection)
            })
            .await;
        self.release(handle).await;
        result
    }

    /// Blocks until one message arrives on the resolved connection.
    ///
    /// # Errors
    ///
    /// Returns a propagated connection/breaker/pool error.
    pub async fn receive(&self) -> Result<Message, Error> {
        let handle = self.resolve().await?;
        let conn = handle.as_connection();
        let result = self
            .spine
            .wrap_operation(Operation::Receive.wrap_name(), || async {
                conn.receive().await.map_err(Error::Connection)
            })
            .await;
        self.release(handle).await;
        result
    }

    /// Issues `subscribe` exactly `max(count, 1)` times on one borrowed
    /// connection. If any attempt fails (after its own retries), the
    /// remaining attempts are not made and the error propagates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `topics` is empty, or whatever
    /// the failing `subscribe` attempt returns.
    pub async fn multi_subscribe(
        &self,
        topics: HashMap<String, Map<String, Value>>,
        properties: Map<String, Value>,
        count: u32,
    ) -> Result<(), Error> {
        require_qos_present(&topics)?;
        let count = count.max(1);
        let handle = self.resolve().await?;
        let conn = handle.as_connection();

        let mut result = Ok(());
        for _ in 0..count {
            result = self
                .spine
                .wrap_operation(Operation::MultiSubscribe.wrap_name(), || async {
                    conn.subscribe(&topics, &properties)
                        .await
                        .map_err(Error::Connection)
                })
                .await;
            if result.is_err() {
                break;
            }
        }

        self.release(handle).await;
        result
    }
}

fn require_qos_present(topics: &HashMap<String, Map<String, Value>>) -> Result<(), Error> {
    if topics.is_empty() {
        return Err(Error::InvalidConfig(
            "topics mapping must not be empty".to_string(),
        ));
    }
    for (topic, props) in topics {
        if !props.contains_key("qos") {
            return Err(Error::InvalidConfig(format!(
                "topic {topic} is missing a qos field"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_parse_rejects_unknown_name() {
        assert!(matches!(
            Operation::parse("delete"),
            Err(Error::InvalidMethod(_))
        ));
    }

    #[test]
    fn operation_parse_accepts_known_names() {
        assert_eq!(Operation::parse("publish").unwrap(), Operation::Publish);
        assert_eq!(
            Operation::parse("multi_subscribe").unwrap(),
            Operation::MultiSubscribe
        );
    }

    #[test]
    fn require_qos_present_rejects_empty_mapping() {
        assert!(require_qos_present(&HashMap::new()).is_err());
    }

    #[test]
    fn require_qos_present_rejects_missing_qos() {
        let mut topics = HashMap::new();
        topics.insert("orders".to_string(), Map::new());
        assert!(require_qos_present(&topics).is_err());
    }

    #[test]
    fn require_qos_present_accepts_valid_mapping() {
        let mut props = Map::new();
        props.insert("qos".to_string(), Value::from(1));
        let mut topics = HashMap::new();
        topics.insert("orders".to_string(), props);
        assert!(require_qos_present(&topics).is_ok());
    }
}
