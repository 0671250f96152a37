// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A bounded connection pool: borrow (`get`), release (`put`), and
//! request-scoped affinity on top of a pluggable [`ConnectionFactory`].

mod connection;
mod context;
mod factory;
mod registry;
#[cfg(feature = "mqtt")]
mod rumqttc_factory;

pub use connection::{ConnectionState, Message, MqttConnection};
pub use context::{ContextStore, NoopContextStore};
pub use factory::ConnectionFactory;
pub use registry::PoolFactory;
#[cfg(feature = "mqtt")]
pub use rumqttc_factory::RumqttcFactory;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, Notify};

use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::{ConnectionError, Error};

struct PoolState {
    idle: VecDeque<Box<dyn MqttConnection>>,
    current_size: u32,
    closed: bool,
}

/// A bounded pool of connections to a single broker endpoint.
///
/// The idle queue is guarded by a [`tokio::sync::Mutex`] rather than
/// `parking_lot`, since `get` may hold the lock across an `.await` while
/// waiting for a slot to free up or a connection to finish dialing.
pub struct ConnectionPool {
    name: String,
    connection_config: ConnectionConfig,
    pool_config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    state: Mutex<PoolState>,
    notify: Notify,
}

impl ConnectionPool {
    /// Creates an empty pool. No connections are dialed until [`Self::get`]
    /// or [`Self::warm_up`] is called.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection_config: ConnectionConfig,
        pool_config: PoolConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            connection_config,
            pool_config,
            factory,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                current_size: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// The name this pool was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Eagerly dials `min_connections` connections so the pool starts warm.
    /// Optional: a pool that is never warmed up simply grows lazily on
    /// demand, in which case the "at least `min_connections` once any
    /// connection exists" invariant holds vacuously.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConnectionError`] the factory raises.
    pub async fn warm_up(&self) -> Result<(), Error> {
        for _ in 0..self.pool_config.min_connections {
            let conn = self.dial().await?;
            let mut state = self.state.lock().await;
            state.idle.push_back(conn);
        }
        Ok(())
    }

    async fn dial(&self) -> Result<Box<dyn MqttConnection>, Error> {
        self.factory
            .connect(&self.connection_config)
            .await
            .map_err(Error::Connection)
    }

    /// Borrows an idle connection, creating one if under `max_connections`,
    /// or waiting up to `wait_timeout` if at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if no connection becomes available
    /// within `wait_timeout`, or a [`Error::Connection`] if dialing fails.
    pub async fn get(&self) -> Result<Box<dyn MqttConnection>, Error> {
        let deadline = Instant::now() + self.pool_config.wait_timeout;

        loop {
            let should_dial = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(Error::Connection(ConnectionError::Closed(
                        "pool is closed".to_string(),
                    )));
                }
                if let Some(conn) = state.idle.pop_front() {
                    return Ok(conn);
                }
                if state.current_size < self.pool_config.max_connections {
                    state.current_size += 1;
                    true
                } else {
                    false
                }
            };

            if should_dial {
                match self.dial().await {
                    Ok(conn) => return Ok(conn),
                    Err(err) => {
                        let mut state = self.state.lock().await;
                        state.current_size = state.current_size.saturating_sub(1);
                        drop(state);
                        self.notify.notify_one();
                        return Err(err);
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::PoolExhausted {
                    wait_ms: self.pool_config.wait_timeout.as_millis() as u64,
                });
            }

            if tokio::time::timeout(remaining, self.notify.notified())
                .await
                .is_err()
            {
                return Err(Error::PoolExhausted {
                    wait_ms: self.pool_config.wait_timeout.as_millis() as u64,
                });
            }
        }
    }

    /// Returns a borrowed connection. A connection no longer alive is
    /// discarded and the pool's size shrinks accordingly.
    pub async fn put(&self, conn: Box<dyn MqttConnection>) {
        let mut state = self.state.lock().await;
        if conn.is_alive() && !state.closed {
            state.idle.push_back(conn);
        } else {
            state.current_size = state.current_size.saturating_sub(1);
        }
        drop(state);
        self.notify.notify_one();
    }

    /// Number of idle connections currently held.
    pub async fn idle_count(&self) -> usize {
        self.state.lock().await.idle.len()
    }

    /// Transitions the pool to its terminal state and closes every idle
    /// connection. Borrowers that `put` afterward have their connections
    /// discarded rather than returned to the (now absent) idle queue.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        let idle = std::mem::take(&mut state.idle);
        drop(state);

        for conn in idle {
            let _ = conn.close().await;
        }
        self.notify.notify_waiters();
    }
}
