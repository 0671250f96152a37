// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pluggable logging for the robustness spine.
//!
//! Callers that already have a `tracing` subscriber wired up get it for free
//! via [`TracingLogger`], the default. Callers that want to route log events
//! elsewhere (or suppress them entirely) implement [`Logger`] themselves.

use std::fmt;

/// A single log field: a key paired with a pre-formatted value.
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Severity-tagged logging sink used by the robustness spine.
///
/// Implementations must be `Send + Sync` since the spine may be shared across
/// tasks.
pub trait Logger: Send + Sync {
    /// Logs a debug-level message with structured fields.
    fn debug(&self, message: &str, fields: &[Field<'_>]);

    /// Logs an info-level message with structured fields.
    ///
    /// Retries are reported here, at info, per the crate's logging policy.
    fn info(&self, message: &str, fields: &[Field<'_>]);

    /// Logs a warn-level message with structured fields.
    ///
    /// Circuit breaker trips are reported here, at warn.
    fn warn(&self, message: &str, fields: &[Field<'_>]);

    /// Logs an error-level message with structured fields.
    fn error(&self, message: &str, fields: &[Field<'_>]);
}

/// A [`Logger`] that forwards to the `tracing` macros.
///
/// This is the default logger used when none is supplied explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        tracing::debug!(fields = %format_fields(fields), "{message}");
    }

    fn info(&self, message: &str, fields: &[Field<'_>]) {
        tracing::info!(fields = %format_fields(fields), "{message}");
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        tracing::warn!(fields = %format_fields(fields), "{message}");
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        tracing::error!(fields = %format_fields(fields), "{message}");
    }
}

fn format_fields(fields: &[Field<'_>]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A [`Logger`] that discards everything.
///
/// Useful for callers that don't want the spine's log volume, or for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str, _fields: &[Field<'_>]) {}
    fn info(&self, _message: &str, _fields: &[Field<'_>]) {}
    fn warn(&self, _message: &str, _fields: &[Field<'_>]) {}
    fn error(&self, _message: &str, _fields: &[Field<'_>]) {}
}
