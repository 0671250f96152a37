// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pluggable mapping from an [`Error`] to a [`FailureKind`] the retry loop
//! acts on.

use crate::error::{Error, FailureKind};

/// Decides whether a failed attempt is worth retrying.
///
/// The default implementation defers to [`Error::failure_kind`]. Supplied
/// as a trait so callers whose downstream raises domain errors outside this
/// crate's [`Error`] type can plug in their own mapping.
pub trait ErrorClassifier: Send + Sync {
    /// Classifies `error` for the retry loop.
    fn classify(&self, error: &Error) -> FailureKind;
}

/// Classifies using [`Error::failure_kind`].
#[derive(Debug, Default)]
pub struct DefaultErrorClassifier;

impl ErrorClassifier for DefaultErrorClassifier {
    fn classify(&self, error: &Error) -> FailureKind {
        error.failure_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classifier_delegates_to_error() {
        let classifier = DefaultErrorClassifier;
        let error = Error::Permanent("bad topic".to_string());
        assert_eq!(classifier.classify(&error), FailureKind::Permanent);
    }

    #[test]
    fn default_classifier_flags_circuit_open() {
        let classifier = DefaultErrorClassifier;
        let error = Error::CircuitOpen("publish".to_string());
        assert_eq!(classifier.classify(&error), FailureKind::CircuitOpen);
    }
}
