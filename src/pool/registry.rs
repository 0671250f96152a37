// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A registry of independently configured, independently breaker-gated
//! named pools.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::Error;
use crate::pool::{ConnectionFactory, ConnectionPool};
use crate::spine::{Spine, SpineBuilder};

struct Entry {
    pool: Arc<ConnectionPool>,
    spine: Arc<Spine>,
}

/// Holds every named pool a process has registered, each with its own
/// sizing, connection config, and circuit breaker state.
pub struct PoolFactory {
    factory: Arc<dyn ConnectionFactory>,
    pools: RwLock<HashMap<String, Entry>>,
}

impl PoolFactory {
    /// Creates an empty registry that dials new pools through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            factory,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a named pool, building a fresh [`Spine`] for it via
    /// `configure_spine`.
    pub fn register(
        &self,
        name: impl Into<String>,
        connection_config: ConnectionConfig,
        pool_config: PoolConfig,
        configure_spine: impl FnOnce(SpineBuilder) -> SpineBuilder,
    ) {
        let name = name.into();
        let pool = Arc::new(ConnectionPool::new(
            name.clone(),
            connection_config,
            pool_config,
            Arc::clone(&self.factory),
        ));
        let spine = Arc::new(configure_spine(SpineBuilder::new()).build());
        self.pools.write().insert(name, Entry { pool, spine });
    }

    /// Looks up a previously registered pool and its spine by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no pool was registered under
    /// `name`.
    pub fn get(&self, name: &str) -> Result<(Arc<ConnectionPool>, Arc<Spine>), Error> {
        self.pools
            .read()
            .get(name)
            .map(|entry| (Arc::clone(&entry.pool), Arc::clone(&entry.spine)))
            .ok_or_else(|| Error::InvalidConfig(format!("no pool registered under {name:?}")))
    }

    /// Names of every registered pool.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.pools.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::ConnectionError;
    use crate::pool::MqttConnection;

    struct StubFactory;

    #[async_trait]
    impl ConnectionFactory for StubFactory {
        async fn connect(
            &self,
            _config: &ConnectionConfig,
        ) -> Result<Box<dyn MqttConnection>, ConnectionError> {
            Err(ConnectionError::ConnectFailed("stub".to_string()))
        }
    }

    #[test]
    fn unregistered_pool_is_an_error() {
        let registry = PoolFactory::new(Arc::new(StubFactory));
        assert!(registry.get("default").is_err());
    }

    #[test]
    fn registered_pool_is_retrievable_by_name() {
        let registry = PoolFactory::new(Arc::new(StubFactory));
        registry.register(
            "default",
            ConnectionConfig::new("broker.local", 1883),
            PoolConfig::new(0, 4),
            |builder| builder,
        );
        assert!(registry.get("default").is_ok());
        assert_eq!(registry.names(), vec!["default".to_string()]);
    }

    #[test]
    fn pools_are_independent_by_name() {
        let registry = PoolFactory::new(Arc::new(StubFactory));
        registry.register(
            "a",
            ConnectionConfig::new("a.local", 1883),
            PoolConfig::new(0, 2),
            |builder| builder,
        );
        registry.register(
            "b",
            ConnectionConfig::new("b.local", 1883),
            PoolConfig::new(0, 8),
            |builder| builder,
        );
        let (pool_a, _) = registry.get("a").unwrap();
        let (pool_b, _) = registry.get("b").unwrap();
        assert_eq!(pool_a.name(), "a");
        assert_eq!(pool_b.name(), "b");
    }
}
