// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the scheduling core.
//!
//! None of these reach the host. Each one marks a branch where the
//! scheduler skips work for the current callback.

use thiserror::Error;

/// Conditions the scheduling core can run into.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// Active count outside `1..=subdivisions`.
    #[error("invalid parameter: {active} active of {subdivisions} subdivisions")]
    InvalidParameter {
        /// Subdivisions per beat
        subdivisions: usize,
        /// Requested number of active slots
        active: usize,
    },

    /// Parameter name not present in the registry.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// No held notes to choose a pitch from.
    #[error("no held notes to select from")]
    EmptyHeldNotes,

    /// Window end is not after its start.
    #[error("degenerate window: [{start}, {end})")]
    DegenerateWindow {
        /// Window start in beats
        start: f64,
        /// Window end in beats
        end: f64,
    },

    /// The host did not supply timing info for this callback.
    #[error("host supplied no timing info")]
    MissingTimingInfo,

    /// A thread panicked while holding the shared engine.
    #[error("engine lock poisoned")]
    LockPoisoned,
}
