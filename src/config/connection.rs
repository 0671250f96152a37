// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection-level configuration (host, port, client id, keep-alive).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum byte length of an MQTT client id, per the data model.
pub const MAX_CLIENT_ID_LENGTH: usize = 23;

/// Configuration for one MQTT broker connection.
///
/// Validated by [`crate::config::ConfigValidator::validate_connection`], not
/// at construction, so it can be deserialized directly from the
/// configuration surface (`pool.<name>.host`, `.port`, ...) and validated in
/// one place alongside pool and topic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hostname or IP address of the broker.
    pub host: String,
    /// TCP port, expected in `[1, 65535]`.
    pub port: u32,
    /// Optional client identifier, at most [`MAX_CLIENT_ID_LENGTH`] bytes.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Optional keep-alive interval in seconds, expected in `[0, 65535]`.
    #[serde(default)]
    pub keep_alive: Option<u32>,
    /// Optional username for broker authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password for broker authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Maximum connect attempts the factory should try before giving up.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Opaque protocol options the core does not interpret (TLS flags, and
    /// so on), passed through verbatim to the connection factory.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ConnectionConfig {
    /// Creates a minimal connection configuration with only host and port
    /// set.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u32) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: None,
            keep_alive: None,
            username: None,
            password: None,
            max_attempts: None,
            options: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_host_and_port() {
        let config = ConnectionConfig::new("broker.local", 1883);
        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1883);
        assert!(config.client_id.is_none());
    }
}
