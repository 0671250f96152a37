// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use mqtt_resilient_pool::config::{ConnectionConfig, PoolConfig};
use mqtt_resilient_pool::error::ConnectionError;
use mqtt_resilient_pool::facade::ClientFacade;
use mqtt_resilient_pool::pool::{ConnectionFactory, ConnectionPool, ConnectionState, Message, MqttConnection};
use mqtt_resilient_pool::spine::SpineBuilder;
use mqtt_resilient_pool::topic::Qos;

struct RecordingConnection {
    subscribe_calls: Arc<Mutex<Vec<HashMap<String, Map<String, Value>>>>>,
}

#[async_trait]
impl MqttConnection for RecordingConnection {
    fn state(&self) -> ConnectionState {
        ConnectionState::Connected
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
        topics: &HashMap<String, Map<String, Value>>,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        self.subscribe_calls.lock().unwrap().push(topics.clone());
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
        Ok(())
    }
}

struct RecordingFactory {
    dials: AtomicUsize,
    subscribe_calls: Arc<Mutex<Vec<HashMap<String, Map<String, Value>>>>>,
}

#[async_trait]
impl ConnectionFactory for RecordingFactory {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn MqttConnection>, ConnectionError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingConnection {
            subscribe_calls: Arc::clone(&self.subscribe_calls),
        }))
    }
}

/// Scenario 6: `multi_subscribe` issues `subscribe` exactly `count` times,
/// with identical arguments each time, on a single borrowed connection.
#[tokio::test]
async fn multi_subscribe_invokes_subscribe_count_times_on_one_connection() {
    let subscribe_calls = Arc::new(Mutex::new(Vec::new()));
    let factory = Arc::new(RecordingFactory {
        dials: AtomicUsize::new(0),
        subscribe_calls: Arc::clone(&subscribe_calls),
    });

    let pool = Arc::new(ConnectionPool::new(
        "default",
        ConnectionConfig::new("broker.local", 1883),
        PoolConfig::new(0, 1).with_wait_timeout(Duration::from_millis(100)),
        factory,
    ));
    let spine = Arc::new(SpineBuilder::new().build());
    let facade = ClientFacade::new(pool.clone(), spine);

    let mut props = Map::new();
    props.insert("qos".to_string(), Value::from(1));
    let mut topics = HashMap::new();
    topics.insert("orders".to_string(), props);

    let result = facade
        .multi_subscribe(topics.clone(), Map::new(), 3)
        .await;
    assert!(result.is_ok());

    let calls = subscribe_calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    for call in calls.iter() {
        assert_eq!(call, &topics);
    }
    drop(calls);

    // The connection was released back to the pool after the batch, not
    // leaked or left borrowed for the duration of all three attempts.
    assert_eq!(pool.idle_count().await, 1);
}

#[tokio::test]
async fn multi_subscribe_rejects_empty_topic_mapping() {
    let factory = Arc::new(RecordingFactory {
        dials: AtomicUsize::new(0),
        subscribe_calls: Arc::new(Mutex::new(Vec::new())),
    });
    let pool = Arc::new(ConnectionPool::new(
        "default",
        ConnectionConfig::new("broker.local", 1883),
        PoolConfig::new(0, 1),
        factory,
    ));
    let spine = Arc::new(SpineBuilder::new().build());
    let facade = ClientFacade::new(pool, spine);

    let result = facade.multi_subscribe(HashMap::new(), Map::new(), 3).await;
    assert!(result.is_err());
}
