// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The closed set of operations a [`crate::facade::ClientFacade`] supports.
//!
//! The source this crate was adapted from dispatches all five through one
//! dynamic entry point; here each is its own [`ClientFacade`] method, and
//! this enum exists only to name the operation for `wrap_operation`'s
//! breaker/metrics bookkeeping.
//!
//! [`ClientFacade`]: crate::facade::ClientFacade

use crate::error::Error;

/// One of the five operations a facade knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// PUBLISH.
    Publish,
    /// SUBSCRIBE.
    Subscribe,
    /// UNSUBSCRIBE.
    Unsubscribe,
    /// Block for the next inbound message.
    Receive,
    /// Issue `subscribe` `n` times on one borrowed connection.
    MultiSubscribe,
}

impl Operation {
    /// Parses an operation name, rejecting anything outside the closed set
    /// with [`Error::InvalidMethod`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMethod`] if `name` is not one of `publish`,
    /// `subscribe`, `unsubscribe`, `receive`, `multi_subscribe`.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "publish" => Ok(Operation::Publish),
            "subscribe" => Ok(Operation::Subscribe),
            "unsubscribe" => Ok(Operation::Unsubscribe),
            "receive" => Ok(Operation::Receive),
            "multi_subscribe" => Ok(Operation::MultiSubscribe),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }

    /// The `wrap_operation` name this operation reports metrics and breaker
    /// state under (`mqtt_<name>`).
    #[must_use]
    pub fn wrap_name(self) -> &'static str {
        match self {
            Operation::Publish => "mqtt_publish",
            Operation::Subscribe => "mqtt_subscribe",
            Operation::Unsubscribe => "mqtt_unsubscribe",
            Operation::Receive => "mqtt_receive",
            Operation::MultiSubscribe => "mqtt_subscribe",
        }
    }
}
