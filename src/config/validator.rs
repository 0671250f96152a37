// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregated, metrics-recording validation for connection, pool, and topic
//! configuration.

use std::sync::Arc;

use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::Error;
use crate::metrics::{ValidationKind, ValidationMetrics};
use crate::topic::{self, TopicConfig, MAX_TOPIC_LENGTH};

/// Validates configuration records, aggregating every violation found into
/// one composite [`Error::InvalidConfig`] instead of failing fast, and
/// recording each outcome to an injected [`ValidationMetrics`] sink.
///
/// The metrics sink is a constructor argument rather than a global, so
/// callers can share one sink across validators and the rest of the
/// crate, or substitute a test double.
pub struct ConfigValidator {
    metrics: Arc<ValidationMetrics>,
}

impl ConfigValidator {
    /// Creates a validator reporting into `metrics`.
    #[must_use]
    pub fn new(metrics: Arc<ValidationMetrics>) -> Self {
        Self { metrics }
    }

    /// Validates a connection configuration: non-empty host, port in
    /// `[1, 65535]`, client id within
    /// [`crate::config::connection::MAX_CLIENT_ID_LENGTH`], keep-alive in
    /// `[0, 65535]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming every violation found.
    pub fn validate_connection(&self, config: &ConnectionConfig) -> Result<(), Error> {
        let mut violations = Vec::new();

        if config.host.trim().is_empty() {
            violations.push("host must not be empty".to_string());
        }
        if config.port == 0 || config.port > 65_535 {
            violations.push(format!(
                "port must be in [1, 65535], got {}",
                config.port
            ));
        }
        if let Some(client_id) = &config.client_id {
            if client_id.len() > super::connection::MAX_CLIENT_ID_LENGTH {
                violations.push(format!(
                    "client_id exceeds {} bytes",
                    super::connection::MAX_CLIENT_ID_LENGTH
                ));
            }
        }
        if let Some(keep_alive) = config.keep_alive {
            if keep_alive > 65_535 {
                violations.push(format!(
                    "keep_alive must be in [0, 65535], got {keep_alive}"
                ));
            }
        }

        self.finish(ValidationKind::ConnectionConfig, violations)
    }

    /// Validates pool sizing: `max_connections >= 1` and
    /// `min_connections <= max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming every violation found.
    pub fn validate_pool(&self, config: &PoolConfig) -> Result<(), Error> {
        let mut violations = Vec::new();

        if config.max_connections == 0 {
            violations.push("max_connections must be at least 1".to_string());
        }
        if config.min_connections > config.max_connections {
            violations.push(format!(
                "min_connections ({}) must not exceed max_connections ({})",
                config.min_connections, config.max_connections
            ));
        }

        self.finish(ValidationKind::PoolConfig, violations)
    }

    /// Validates an already-constructed [`TopicConfig`], re-checking the
    /// invariants [`TopicConfig::new`] enforces at construction and
    /// recording the outcome under [`ValidationKind::TopicConfig`].
    ///
    /// [`TopicConfig::new`] cannot itself produce an invalid record, so this
    /// exists for callers that want every topic config that flows through
    /// the system accounted for in the validation metrics, not just the
    /// bare-filter path ([`Self::validate_topic_filter`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming every violation found.
    pub fn validate_topic_config(&self, config: &TopicConfig) -> Result<(), Error> {
        let mut violations = Vec::new();

        if config.topic().len() > MAX_TOPIC_LENGTH {
            violations.push(format!(
                "topic exceeds maximum length of {MAX_TOPIC_LENGTH} bytes"
            ));
        }
        if config.enable_share_topic() && config.enable_queue_topic() {
            violations.push("share and queue topics are mutually exclusive".to_string());
        }
        if config.enable_multi_sub() && config.multi_sub_num() == 0 {
            violations.push("enableMultiSub requires multiSubNum >= 1".to_string());
        }
        let outcome = topic::validate(config.topic());
        if !outcome.valid {
            if let Some(message) = outcome.error_message {
                violations.push(message);
            }
        }

        self.finish(ValidationKind::TopicConfig, violations)
    }

    /// Validates a bare topic filter string (length and wildcard syntax),
    /// without constructing a [`crate::topic::TopicConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming every violation found.
    pub fn validate_topic_filter(&self, filter: &str) -> Result<(), Error> {
        let mut violations = Vec::new();

        if filter.len() > MAX_TOPIC_LENGTH {
            violations.push(format!(
                "topic filter exceeds maximum length of {MAX_TOPIC_LENGTH} bytes"
            ));
        }
        let outcome = topic::validate(filter);
        if !outcome.valid {
            if let Some(message) = outcome.error_message {
                violations.push(message);
            }
        }

        self.finish(ValidationKind::TopicFilter, violations)
    }

    fn finish(&self, kind: ValidationKind, violations: Vec<String>) -> Result<(), Error> {
        if violations.is_empty() {
            self.metrics.record_success(kind);
            Ok(())
        } else {
            let message = violations.join("; ");
            self.metrics.record_failure(kind, message.clone());
            Err(Error::InvalidConfig(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ConfigValidator {
        ConfigValidator::new(Arc::new(ValidationMetrics::new()))
    }

    #[test]
    fn accepts_well_formed_connection() {
        let validator = validator();
        let config = ConnectionConfig::new("broker.local", 1883);
        assert!(validator.validate_connection(&config).is_ok());
    }

    #[test]
    fn rejects_empty_host_and_bad_port_together() {
        let validator = validator();
        let mut config = ConnectionConfig::new("", 70_000);
        config.port = 70_000;
        let err = validator.validate_connection(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("host"));
        assert!(message.contains("port"));
    }

    #[test]
    fn rejects_client_id_over_limit() {
        let validator = validator();
        let mut config = ConnectionConfig::new("broker.local", 1883);
        config.client_id = Some("x".repeat(24));
        assert!(validator.validate_connection(&config).is_err());
    }

    #[test]
    fn accepts_balanced_pool() {
        let validator = validator();
        let config = PoolConfig::new(2, 8);
        assert!(validator.validate_pool(&config).is_ok());
    }

    #[test]
    fn rejects_min_greater_than_max() {
        let validator = validator();
        let config = PoolConfig::new(10, 2);
        assert!(validator.validate_pool(&config).is_err());
    }

    #[test]
    fn rejects_zero_max_connections() {
        let validator = validator();
        let config = PoolConfig::new(0, 0);
        assert!(validator.validate_pool(&config).is_err());
    }

    #[test]
    fn metrics_record_validation_outcomes() {
        let metrics = Arc::new(ValidationMetrics::new());
        let validator = ConfigValidator::new(Arc::clone(&metrics));
        let _ = validator.validate_connection(&ConnectionConfig::new("broker.local", 1883));
        let _ = validator.validate_connection(&ConnectionConfig::new("", 0));
        assert_eq!(metrics.success_rate(ValidationKind::ConnectionConfig), 0.5);
    }

    #[test]
    fn validates_topic_filter_syntax() {
        let validator = validator();
        assert!(validator.validate_topic_filter("sensors/+/temp").is_ok());
        assert!(validator.validate_topic_filter("sensors/#/temp").is_err());
    }

    #[test]
    fn accepts_well_formed_topic_config() {
        let validator = validator();
        let config = crate::topic::parse_topic("sensors/room1/temp", 1, None).unwrap();
        assert!(validator.validate_topic_config(&config).is_ok());
    }

    #[test]
    fn metrics_record_topic_config_outcomes() {
        let metrics = Arc::new(ValidationMetrics::new());
        let validator = ConfigValidator::new(Arc::clone(&metrics));
        let config = crate::topic::parse_topic("sensors/room1/temp", 1, None).unwrap();
        let _ = validator.validate_topic_config(&config);
        assert_eq!(metrics.success_rate(ValidationKind::TopicConfig), 1.0);
    }
}
