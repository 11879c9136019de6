// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core for turning held notes into beat-synchronous notes.
//!
//! This module provides the scheduling infrastructure:
//! - Held note tracking
//! - Note selection by order
//! - The beat cursor state machine
//! - The per-buffer scheduler with loop wraparound
//! - The engine that ties them to the host callbacks

pub mod cursor;
pub mod engine;
pub mod held;
pub mod scheduler;
pub mod selection;

pub use cursor::{BeatCursor, CursorState};
pub use engine::{Eggiator, SharedEggiator};
pub use held::{HeldNote, HeldNotes};
pub use scheduler::{
    BufferScheduler, NoteLengthUnit, OffsetRefresh, RearmMode, ScheduledNote, SchedulerSettings,
};
pub use selection::{slot_step, NoteOrder};
