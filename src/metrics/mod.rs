// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metrics sinks used by configuration validation, the robustness spine,
//! and connection pooling.

mod performance;
mod success;
mod validation;
mod window;

pub use performance::{MemorySampler, NoopMemorySampler, PerformanceMetrics};
pub use success::ConnectionSuccessMetrics;
pub use validation::{ValidationKind, ValidationMetrics};
pub use window::OutcomeWindow;

#[cfg(feature = "memory-sampler")]
pub use performance::ProcSelfStatmSampler;
