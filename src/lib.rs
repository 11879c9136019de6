// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat-synchronous arpeggiator and drum-eggiator core.
//!
//! Each beat is split into subdivisions, a random subset of them is chosen
//! to carry notes, and the chosen slots are played from the held input
//! notes as the host transport moves through its audio buffers.
//!
//! - [`generators`]: rhythm patterns and their time offsets
//! - [`sequencer`]: held notes, note order, the beat cursor, the buffer
//!   scheduler and the [`Eggiator`] engine
//! - [`timing`]: host timing windows and a simulated transport
//! - [`midi`]: event types and the host note sink
//! - [`control`]: the named parameter surface
//! - [`config`]: YAML/TOML engine configuration

pub mod config;
pub mod control;
pub mod error;
pub mod generators;
pub mod midi;
pub mod sequencer;
pub mod timing;

pub use config::EngineConfig;
pub use error::SchedulerError;
pub use midi::{EventLog, EventTime, MidiEvent, NoteSink};
pub use sequencer::{BufferScheduler, Eggiator, ScheduledNote, SchedulerSettings, SharedEggiator};
pub use timing::{SimulatedTransport, TimingWindow};
