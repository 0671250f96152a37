// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use mqtt_resilient_pool::config::{ConnectionConfig, PoolConfig};
use mqtt_resilient_pool::error::{ConnectionError, Error};
use mqtt_resilient_pool::facade::ClientFacade;
use mqtt_resilient_pool::pool::{
    ConnectionFactory, ConnectionPool, ConnectionState, ContextStore, Message, MqttConnection,
};
use mqtt_resilient_pool::spine::SpineBuilder;
use mqtt_resilient_pool::topic::Qos;

struct FakeConnection {
    alive: AtomicBool,
}

#[async_trait]
impl MqttConnection for FakeConnection {
    fn state(&self) -> ConnectionState {
        if self.alive.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Failed
        }
    }

    async fn publish(
        &self,
        _topic: &str,
        _payload: &[u8],
        _qos: Qos,
        _dup: bool,
        _retain: bool,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn subscribe(
        &self,
        _topics: &HashMap<String, Map<String, Value>>,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn unsubscribe(
        &self,
        _topics: &HashMap<String, Map<String, Value>>,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn receive(&self) -> Result<Message, ConnectionError> {
        Ok(Message {
            topic: "orders".to_string(),
            payload: vec![],
            qos: Qos::AtMostOnce,
            retain: false,
            dup: false,
            properties: Map::new(),
        })
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`ContextStore`] fixed to report affinity (or not) to a single
/// connection, standing in for a host application's request-scoped state.
struct FakeContextStore {
    connection: Option<Arc<dyn MqttConnection>>,
}

impl ContextStore for FakeContextStore {
    fn has(&self, _pool_name: &str) -> bool {
        self.connection.is_some()
    }

    fn get(&self, _pool_name: &str) -> Option<Arc<dyn MqttConnection>> {
        self.connection.clone()
    }
}

struct FakeFactory;

#[async_trait]
impl ConnectionFactory for FakeFactory {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn MqttConnection>, ConnectionError> {
        Ok(Box::new(FakeConnection {
            alive: AtomicBool::new(true),
        }))
    }
}

fn pool(max: u32, wait_timeout: Duration) -> Arc<ConnectionPool> {
    Arc::new(ConnectionPool::new(
        "default",
        ConnectionConfig::new("broker.local", 1883),
        PoolConfig::new(0, max).with_wait_timeout(wait_timeout),
        Arc::new(FakeFactory),
    ))
}

/// Scenario 4: pool exhaustion under contention, and recovery once a
/// borrower releases its connection.
#[tokio::test]
async fn pool_exhaustion_then_recovery_after_release() {
    let pool = pool(2, Duration::from_millis(100));

    let conn_a = pool.get().await.unwrap();
    let conn_b = pool.get().await.unwrap();

    let started = std::time::Instant::now();
    let exhausted = pool.get().await;
    assert!(matches!(exhausted, Err(Error::PoolExhausted { .. })));
    assert!(started.elapsed() >= Duration::from_millis(90));

    pool.put(conn_b).await;
    let recovered = pool.get().await;
    assert!(recovered.is_ok());

    pool.put(conn_a).await;
    pool.put(recovered.unwrap()).await;
}

#[tokio::test]
async fn concurrent_waiter_is_unblocked_by_release() {
    let pool = pool(1, Duration::from_millis(500));
    let held = pool.get().await.unwrap();

    let waiter_pool = Arc::clone(&pool);
    let waiter = tokio::spawn(async move { waiter_pool.get().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    pool.put(held).await;

    let result = waiter.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn pool_never_exceeds_max_connections_under_concurrent_load() {
    let pool = pool(2, Duration::from_millis(200));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let conn = pool.get().await.unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            pool.put(conn).await;
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pool.idle_count().await, 2);
}

/// Scenario 4 (affinity variant): a facade with context-scoped affinity
/// never calls `pool.get()`, so it does not compete for the pool's slots
/// with a facade that has none.
#[tokio::test]
async fn context_affinity_borrower_never_consumes_a_pool_slot() {
    let pool = pool(1, Duration::from_millis(100));
    let spine = Arc::new(SpineBuilder::new().build());

    let context_connection: Arc<dyn MqttConnection> = Arc::new(FakeConnection {
        alive: AtomicBool::new(true),
    });
    let context_store: Arc<dyn ContextStore> = Arc::new(FakeContextStore {
        connection: Some(context_connection),
    });
    let facade_a = ClientFacade::new(Arc::clone(&pool), Arc::clone(&spine))
        .with_context_store(context_store);
    let facade_c = ClientFacade::new(Arc::clone(&pool), spine);

    // B holds the pool's only slot directly, bypassing any facade.
    let conn_b = pool.get().await.unwrap();

    // A has context affinity, so it succeeds even though the pool is full.
    let props = Map::new();
    let a_result = facade_a
        .publish("status", b"online", Qos::AtMostOnce, false, false, props.clone())
        .await;
    assert!(a_result.is_ok());

    // C has no affinity and must borrow from the exhausted pool.
    let started = std::time::Instant::now();
    let c_result = facade_c
        .publish("status", b"online", Qos::AtMostOnce, false, false, props.clone())
        .await;
    assert!(matches!(c_result, Err(Error::PoolExhausted { .. })));
    assert!(started.elapsed() >= Duration::from_millis(90));

    pool.put(conn_b).await;
    let recovered = facade_c
        .publish("status", b"online", Qos::AtMostOnce, false, false, props)
        .await;
    assert!(recovered.is_ok());
}
