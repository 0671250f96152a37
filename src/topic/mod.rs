// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bidirectional translation between wire topic strings and the structured
//! [`TopicConfig`] record, plus wildcard validation and matching.
//!
//! Every function here is pure: no shared state, no I/O, no metrics. The
//! [`crate::config`] module wraps [`validate`] and [`TopicConfig::new`] with
//! the metrics recording the rest of the crate needs.

mod qos;
mod wildcard;

pub use qos::{Qos, RetainHandling};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Maximum allowed byte length of a topic or filter.
pub const MAX_TOPIC_LENGTH: usize = 65_535;

/// The non-standard `$queue/` wire prefix.
const QUEUE_PREFIX: &str = "$queue/";
/// The `$share/` wire prefix (MQTT 5 shared subscriptions).
const SHARE_PREFIX: &str = "$share/";

/// Group metadata for a shared subscription.
///
/// Stored as a single-element list under a fixed `group_name` key, mirroring
/// the wire-compatible shape this crate's data model inherited: `{
/// "group_name": ["worker-group"] }`. The extra indirection (list of one)
/// hints at a never-completed extension to multiple groups; this crate
/// preserves the shape without interpreting lists longer than one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTopic {
    group_name: Vec<String>,
}

impl ShareTopic {
    /// Creates a share-topic record for the given group.
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group_name: vec![group.into()],
        }
    }

    /// Returns the single group name this subscription shares with.
    #[must_use]
    pub fn group(&self) -> &str {
        self.group_name.first().map_or("", String::as_str)
    }
}

/// A structured description of one logical subscription/publication slot.
///
/// Constructed either by [`parse_topic`] (from a wire string) or directly via
/// [`TopicConfig::new`] (from application code that already knows the parts).
/// All invariants from the data model are enforced at construction; there is
/// no way to observe a `TopicConfig` that violates them.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicConfig {
    topic: String,
    qos: Qos,
    enable_share_topic: bool,
    share_topic: Option<ShareTopic>,
    enable_queue_topic: bool,
    enable_multi_sub: bool,
    multi_sub_num: u32,
    retain_handling: RetainHandling,
    retain: bool,
    dup: bool,
    properties: Map<String, Value>,
}

impl TopicConfig {
    /// Creates a topic configuration, enforcing every invariant in a single
    /// pass and aggregating all violations into one [`Error::InvalidConfig`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topic: impl Into<String>,
        qos: Qos,
        enable_share_topic: bool,
        share_topic: Option<ShareTopic>,
        enable_queue_topic: bool,
        enable_multi_sub: bool,
        multi_sub_num: u32,
        retain_handling: RetainHandling,
        retain: bool,
        dup: bool,
        properties: Map<String, Value>,
    ) -> Result<Self, Error> {
        let topic = sanitize(&topic.into());
        let mut violations = Vec::new();

        if topic.len() > MAX_TOPIC_LENGTH {
            violations.push(format!(
                "topic exceeds maximum length of {MAX_TOPIC_LENGTH} bytes"
            ));
        }
        if enable_share_topic && enable_queue_topic {
            violations.push("share and queue topics are mutually exclusive".to_string());
        }
        if enable_multi_sub && multi_sub_num == 0 {
            violations.push("enableMultiSub requires multiSubNum >= 1".to_string());
        }
        violations.extend(wildcard::violations(&topic));

        if !violations.is_empty() {
            return Err(Error::InvalidConfig(violations.join("; ")));
        }

        // Queue has priority during parsing, so if both were (invalidly)
        // requested by a caller that bypassed the check above, we would
        // already have rejected it. Here we just carry the resolved flags.
        let enable_share_topic = enable_share_topic && !enable_queue_topic;

        Ok(Self {
            topic,
            qos,
            enable_share_topic,
            share_topic: if enable_share_topic { share_topic } else { None },
            enable_queue_topic,
            enable_multi_sub,
            multi_sub_num: multi_sub_num.max(1),
            retain_handling,
            retain,
            dup,
            properties,
        })
    }

    /// The bare topic or filter, with wildcards and prefixes stripped.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The Quality of Service level.
    #[must_use]
    pub fn qos(&self) -> Qos {
        self.qos
    }

    /// Whether this is a shared subscription (`$share/<group>/...`).
    #[must_use]
    pub fn enable_share_topic(&self) -> bool {
        self.enable_share_topic
    }

    /// Share-group metadata, present iff [`Self::enable_share_topic`].
    #[must_use]
    pub fn share_topic(&self) -> Option<&ShareTopic> {
        self.share_topic.as_ref()
    }

    /// Whether this is a queue subscription (`$queue/...`).
    #[must_use]
    pub fn enable_queue_topic(&self) -> bool {
        self.enable_queue_topic
    }

    /// Whether the facade should issue [`Self::multi_sub_num`] duplicate
    /// SUBSCRIBEs for this topic.
    #[must_use]
    pub fn enable_multi_sub(&self) -> bool {
        self.enable_multi_sub
    }

    /// Number of duplicate SUBSCRIBEs to issue when `enable_multi_sub` is set.
    #[must_use]
    pub fn multi_sub_num(&self) -> u32 {
        self.multi_sub_num
    }

    /// The retain-handling mode (0, 1, or 2) as sent in the SUBSCRIBE.
    #[must_use]
    pub fn retain_handling(&self) -> RetainHandling {
        self.retain_handling
    }

    /// Whether the broker should treat this as a retained message.
    #[must_use]
    pub fn retain(&self) -> bool {
        self.retain
    }

    /// Whether this is a duplicate delivery (wire DUP flag).
    #[must_use]
    pub fn dup(&self) -> bool {
        self.dup
    }

    /// Opaque, pass-through properties the core does not interpret.
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Renders the wire-level topic string this configuration describes,
    /// applying the `$share/` or `$queue/` prefix as configured.
    #[must_use]
    pub fn to_wire_topic(&self) -> String {
        if self.enable_queue_topic {
            generate_queue_topic(&self.topic)
        } else if let Some(share) = &self.share_topic {
            generate_share_topic(&self.topic, share.group())
        } else {
            self.topic.clone()
        }
    }
}

/// Strips NUL and C0/C1 control bytes from a string. Idempotent:
/// `sanitize(sanitize(s)) == sanitize(s)`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            let code = *c as u32;
            !(code == 0x00 || (0x01..=0x1F).contains(&code) || (0x7F..=0x9F).contains(&code))
        })
        .collect()
}

/// Builds the wire string for a shared subscription: `$share/<group>/<topic>`.
#[must_use]
pub fn generate_share_topic(topic: &str, group: &str) -> String {
    let group = if group.is_empty() { "default" } else { group };
    format!("{SHARE_PREFIX}{group}/{topic}")
}

/// Builds the wire string for a queue subscription: `$queue/<topic>`.
#[must_use]
pub fn generate_queue_topic(topic: &str) -> String {
    format!("{QUEUE_PREFIX}{topic}")
}

/// Builds a single-entry `{topic: props}` mapping, requiring `props` to carry
/// a `qos` key.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `props` has no `qos` field.
pub fn generate_topic_array(
    topic: impl Into<String>,
    props: Map<String, Value>,
) -> Result<HashMap<String, Map<String, Value>>, Error> {
    if !props.contains_key("qos") {
        return Err(Error::InvalidConfig(
            "topic properties must contain a qos field".to_string(),
        ));
    }
    let mut out = HashMap::with_capacity(1);
    out.insert(topic.into(), props);
    Ok(out)
}

/// Parses a wire topic string into a structured [`TopicConfig`].
///
/// Checks prefixes in priority order using **exact** prefix matching
/// (`$queue/` before `$share/`, otherwise bare). This deviates intentionally
/// from a substring-containment check: a topic like `sensors/$queue/x` is a
/// bare topic, not a queue topic. See the crate's design notes for why.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `qos` is not in `{0,1,2}` or the
/// resulting bare topic fails wildcard validation.
pub fn parse_topic(
    wire_topic: &str,
    qos: u8,
    props: Option<Map<String, Value>>,
) -> Result<TopicConfig, Error> {
    let qos = Qos::try_from(qos)?;
    let sanitized = sanitize(wire_topic);
    let properties = props.unwrap_or_default();

    if let Some(rest) = sanitized.strip_prefix(QUEUE_PREFIX) {
        TopicConfig::new(
            rest,
            qos,
            false,
            None,
            true,
            false,
            1,
            RetainHandling::SendAtSubscribe,
            false,
            false,
            properties,
        )
    } else if let Some(rest) = sanitized.strip_prefix(SHARE_PREFIX) {
        let mut levels = rest.splitn(2, '/');
        let raw_group = levels.next().unwrap_or_default();
        let bare_topic = levels.next().unwrap_or_default();
        let group = raw_group.strip_prefix('$').unwrap_or(raw_group);
        TopicConfig::new(
            bare_topic,
            qos,
            true,
            Some(ShareTopic::new(group)),
            false,
            false,
            1,
            RetainHandling::SendAtSubscribe,
            false,
            false,
            properties,
        )
    } else {
        TopicConfig::new(
            sanitized,
            qos,
            false,
            None,
            false,
            false,
            1,
            RetainHandling::SendAtSubscribe,
            false,
            false,
            properties,
        )
    }
}

/// Outcome of validating a topic filter with [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the filter is syntactically valid.
    pub valid: bool,
    /// A human-readable description of the first violation found, if any.
    pub error_message: Option<String>,
}

/// Validates a topic filter's wildcard syntax. Never raises; reports the
/// outcome in the return value.
#[must_use]
pub fn validate(filter: &str) -> ValidationOutcome {
    let violations = wildcard::violations(filter);
    if violations.is_empty() {
        ValidationOutcome {
            valid: true,
            error_message: None,
        }
    } else {
        ValidationOutcome {
            valid: false,
            error_message: Some(violations.join("; ")),
        }
    }
}

/// Matches a concrete topic against a filter that may contain `+` and `#`
/// wildcards.
#[must_use]
pub fn matches(pattern: &str, topic: &str) -> bool {
    let pattern_levels: Vec<&str> = pattern.split('/').collect();
    let topic_levels: Vec<&str> = topic.split('/').collect();
    wildcard::matches_levels(&pattern_levels, &topic_levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_bytes() {
        assert_eq!(sanitize("malicious\u{0}\u{1}topic"), "malicioustopic");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let s = "malicious\u{0}topic";
        assert_eq!(sanitize(sanitize(s).as_str()), sanitize(s));
    }

    #[test]
    fn generate_share_topic_format() {
        assert_eq!(
            generate_share_topic("data/processing/queue", "worker-group"),
            "$share/worker-group/data/processing/queue"
        );
    }

    #[test]
    fn generate_queue_topic_format() {
        assert_eq!(generate_queue_topic("orders"), "$queue/orders");
    }

    #[test]
    fn generate_topic_array_requires_qos() {
        let mut props = Map::new();
        props.insert("qos".to_string(), Value::from(1));
        let result = generate_topic_array("orders", props).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("orders"));
    }

    #[test]
    fn generate_topic_array_missing_qos_errors() {
        let result = generate_topic_array("orders", Map::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn share_topic_round_trip() {
        let wire = generate_share_topic("data/processing/queue", "worker-group");
        let parsed = parse_topic(&wire, 1, None).unwrap();
        assert_eq!(parsed.topic(), "data/processing/queue");
        assert!(parsed.enable_share_topic());
        assert_eq!(parsed.share_topic().unwrap().group(), "worker-group");
    }

    #[test]
    fn queue_topic_round_trip() {
        let wire = generate_queue_topic("devices/status");
        let parsed = parse_topic(&wire, 0, None).unwrap();
        assert_eq!(parsed.topic(), "devices/status");
        assert!(parsed.enable_queue_topic());
    }

    #[test]
    fn parse_topic_rejects_bad_qos() {
        let result = parse_topic("a/b", 3, None);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn parse_topic_sanitizes_control_bytes() {
        let parsed = parse_topic("malicious\u{0}\u{1}topic", 1, None).unwrap();
        assert_eq!(parsed.topic(), "malicioustopic");
    }

    #[test]
    fn exact_prefix_match_not_substring() {
        // A bare topic that merely contains "$queue" must not be
        // misinterpreted as a queue topic (deviation from the buggy source).
        let parsed = parse_topic("sensors/$queue/x", 0, None).unwrap();
        assert!(!parsed.enable_queue_topic());
        assert_eq!(parsed.topic(), "sensors/$queue/x");
    }

    #[test]
    fn validate_wildcards() {
        assert!(validate("sensors/+/temp").valid);
        assert!(validate("sensors/#").valid);
        assert!(!validate("sensors/#/temp").valid);
        assert!(!validate("sensors/+x").valid);
        assert!(!validate("sensors//x").valid);
    }

    #[test]
    fn validate_error_messages_identify_violation() {
        let hash_not_terminal = validate("sensors/#/temp");
        assert!(
            hash_not_terminal
                .error_message
                .as_deref()
                .unwrap()
                .contains("final level")
        );

        let plus_not_alone = validate("sensors/+x");
        assert!(
            plus_not_alone
                .error_message
                .as_deref()
                .unwrap()
                .contains("stand alone")
        );

        let empty_level = validate("sensors//x");
        assert!(
            empty_level
                .error_message
                .as_deref()
                .unwrap()
                .contains("empty")
        );
    }

    #[test]
    fn matches_plus_wildcard() {
        assert!(matches("sensors/+/temp", "sensors/room1/temp"));
        assert!(!matches("sensors/+/temp", "sensors/room1/room2/temp"));
    }

    #[test]
    fn matches_hash_wildcard_includes_parent() {
        assert!(matches("sensors/#", "sensors"));
        assert!(matches("sensors/#", "sensors/a/b"));
    }

    #[test]
    fn matches_standalone_hash_matches_everything() {
        assert!(matches("#", "anything/at/all"));
        assert!(matches("#", "x"));
    }

    #[test]
    fn matches_exact_topic() {
        assert!(matches("sensors/room1/temp", "sensors/room1/temp"));
        assert!(!matches("sensors/room1/temp", "sensors/room2/temp"));
    }

    #[test]
    fn topic_length_boundary() {
        let ok = "a".repeat(MAX_TOPIC_LENGTH);
        assert!(parse_topic(&ok, 0, None).is_ok());

        let too_long = "a".repeat(MAX_TOPIC_LENGTH + 1);
        assert!(parse_topic(&too_long, 0, None).is_err());
    }

    #[test]
    fn share_and_queue_are_mutually_exclusive() {
        let mut props = Map::new();
        props.insert("qos".to_string(), Value::from(0));
        let result = TopicConfig::new(
            "orders",
            Qos::AtMostOnce,
            true,
            Some(ShareTopic::new("g")),
            true,
            false,
            1,
            RetainHandling::SendAtSubscribe,
            false,
            false,
            props,
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn multi_sub_requires_positive_count() {
        let result = TopicConfig::new(
            "orders",
            Qos::AtMostOnce,
            false,
            None,
            false,
            true,
            0,
            RetainHandling::SendAtSubscribe,
            false,
            false,
            Map::new(),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn to_wire_topic_applies_queue_prefix() {
        let config = parse_topic("$queue/orders", 1, None).unwrap();
        assert_eq!(config.to_wire_topic(), "$queue/orders");
    }
}
