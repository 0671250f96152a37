// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A [`ConnectionFactory`] backed by `rumqttc::{AsyncClient, EventLoop}`,
//! wired up the same way `tasmor_lib::protocol::mqtt_broker` establishes a
//! broker session: spawn the event loop, wait for the `ConnAck` via a
//! oneshot, and route incoming `Publish` packets into a channel `receive`
//! reads from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::config::ConnectionConfig;
use crate::error::ConnectionError;
use crate::pool::connection::{ConnectionState, Message, MqttConnection};
use crate::pool::factory::ConnectionFactory;
use crate::topic::Qos;

fn to_rumqttc_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

fn from_rumqttc_qos(qos: QoS) -> Qos {
    match qos {
        QoS::AtMostOnce => Qos::AtMostOnce,
        QoS::AtLeastOnce => Qos::AtLeastOnce,
        QoS::ExactlyOnce => Qos::ExactlyOnce,
    }
}

/// Dials connections via `rumqttc`.
///
/// Each call to [`RumqttcFactory::connect`] opens a fresh broker session
/// with its own client id, event-loop task, and inbound message channel.
#[derive(Debug, Default)]
pub struct RumqttcFactory {
    connect_timeout: Duration,
}

impl RumqttcFactory {
    /// Creates a factory that waits up to `connect_timeout` for the broker's
    /// `ConnAck` before giving up.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl ConnectionFactory for RumqttcFactory {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn MqttConnection>, ConnectionError> {
        if config.host.is_empty() {
            return Err(ConnectionError::ConnectFailed(
                "host must not be empty".to_string(),
            ));
        }

        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("mqtt-resilient-pool-{}", uuid::Uuid::new_v4()));

        let port = u16::try_from(config.port)
            .map_err(|_| ConnectionError::ConnectFailed(format!("port out of range: {}", config.port)))?;
        let mut options = MqttOptions::new(client_id, &config.host, port);
        if let Some(keep_alive) = config.keep_alive {
            options.set_keep_alive(Duration::from_secs(u64::from(keep_alive)));
        }
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 64);
        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let (connack_tx, connack_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(false));

        tokio::spawn(drive_event_loop(
            event_loop,
            inbound_tx,
            Some(connack_tx),
            Arc::clone(&connected),
        ));

        match tokio::time::timeout(self.connect_timeout, connack_rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(ConnectionError::Closed(
                    "mqtt event loop terminated before ConnAck".to_string(),
                ));
            }
            Err(_) => {
                return Err(ConnectionError::Timeout(
                    self.connect_timeout.as_millis() as u64,
                ));
            }
        }

        Ok(Box::new(RumqttcConnection {
            client,
            inbound: Mutex::new(inbound_rx),
            connected,
        }))
    }
}

async fn drive_event_loop(
    mut event_loop: rumqttc::EventLoop,
    inbound: mpsc::Sender<Message>,
    mut connack_tx: Option<oneshot::Sender<()>>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                    qos: from_rumqttc_qos(publish.qos),
                    retain: publish.retain,
                    dup: publish.dup,
                    properties: Map::new(),
                };
                if inbound.send(message).await.is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(error = %error, "mqtt event loop terminated");
                connected.store(false, Ordering::Release);
                break;
            }
        }
    }
}

struct RumqttcConnection {
    client: AsyncClient,
    inbound: Mutex<mpsc::Receiver<Message>>,
    connected: Arc<AtomicBool>,
}

#[async_trait]
impl MqttConnection for RumqttcConnection {
    fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::Acquire) {
            ConnectionState::Connected
        } else {
            ConnectionState::Failed
        }
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        _dup: bool,
        retain: bool,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        // rumqttc's high-level AsyncClient does not expose the wire DUP flag;
        // it is managed internally by the client's retransmission logic.
        self.client
            .publish(topic, to_rumqttc_qos(qos), retain, payload.to_vec())
            .await
            .map_err(ConnectionError::Mqtt)
    }

    async fn subscribe(
        &self,
        topics: &HashMap<String, Map<String, Value>>,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        for (topic, props) in topics {
            let qos = props
                .get("qos")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            let qos = Qos::try_from(u8::try_from(qos).unwrap_or(0))
                .map(to_rumqttc_qos)
                .unwrap_or(QoS::AtMostOnce);
            self.client
                .subscribe(topic, qos)
                .await
                .map_err(ConnectionError::Mqtt)?;
        }
        Ok(())
    }

    async fn unsubscribe(
        &self,
        topics: &HashMap<String, Map<String, Value>>,
        _properties: &Map<String, Value>,
    ) -> Result<(), ConnectionError> {
        for topic in topics.keys() {
            self.client
                .unsubscribe(topic)
                .await
                .map_err(ConnectionError::Mqtt)?;
        }
        Ok(())
    }

    async fn receive(&self) -> Result<Message, ConnectionError> {
        self.inbound
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| ConnectionError::Closed("inbound channel closed".to_string()))
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.client.disconnect().await.map_err(ConnectionError::Mqtt)?;
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}
