// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI event types and the host-facing note sink.
//!
//! The core never performs I/O itself. It hands every event it produces
//! to a [`NoteSink`] supplied by the host, tagged with the time at which
//! the host should play it.

pub mod input;

pub use input::parse;

/// A MIDI event as seen by the note callback and produced by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum MidiEvent {
    /// Note On: channel (0-15), pitch (0-127), velocity (1-127)
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    /// Note Off: channel (0-15), pitch (0-127), release velocity
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    /// Anything else, passed through untouched
    Other(Vec<u8>),
}

impl MidiEvent {
    /// Note on for channel 0
    pub fn note_on(pitch: u8, velocity: u8) -> Self {
        MidiEvent::NoteOn {
            channel: 0,
            pitch: pitch & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    /// Note off for channel 0
    pub fn note_off(pitch: u8) -> Self {
        MidiEvent::NoteOff {
            channel: 0,
            pitch: pitch & 0x7F,
            velocity: 0,
        }
    }

    /// Move a note event onto `channel`; other events are unchanged
    pub fn with_channel(mut self, channel: u8) -> Self {
        if let MidiEvent::NoteOn { channel: c, .. } | MidiEvent::NoteOff { channel: c, .. } =
            &mut self
        {
            *c = channel & 0x0F;
        }
        self
    }

    /// Pitch of a note event
    pub fn pitch(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { pitch, .. } | MidiEvent::NoteOff { pitch, .. } => Some(*pitch),
            MidiEvent::Other(_) => None,
        }
    }

    /// Channel of a note event
    pub fn channel(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { channel, .. } | MidiEvent::NoteOff { channel, .. } => {
                Some(*channel)
            }
            MidiEvent::Other(_) => None,
        }
    }

    /// Convert to MIDI bytes
    pub fn to_midi_bytes(&self) -> Vec<u8> {
        match self {
            MidiEvent::NoteOn { channel, pitch, velocity } => {
                vec![messages::NOTE_ON | channel, *pitch, *velocity]
            }
            MidiEvent::NoteOff { channel, pitch, velocity } => {
                vec![messages::NOTE_OFF | channel, *pitch, *velocity]
            }
            MidiEvent::Other(bytes) => bytes.clone(),
        }
    }
}

/// When the host should play an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventTime {
    /// As soon as possible (pass-through and flushes)
    Now,
    /// At an absolute host beat position
    Beat(f64),
}

/// Host-provided destination for scheduled events.
///
/// Implementations are expected to queue rather than block; the scheduler
/// calls this from inside the buffer callback.
pub trait NoteSink {
    /// Queue an event for playback at the given time
    fn schedule(&mut self, event: MidiEvent, at: EventTime);
}

/// Sink that records every event it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<(MidiEvent, EventTime)>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events
    pub fn events(&self) -> &[(MidiEvent, EventTime)] {
        &self.events
    }

    /// Recorded note ons with their times
    pub fn note_ons(&self) -> impl Iterator<Item = &(MidiEvent, EventTime)> {
        self.events
            .iter()
            .filter(|(e, _)| matches!(e, MidiEvent::NoteOn { .. }))
    }

    /// Recorded note offs with their times
    pub fn note_offs(&self) -> impl Iterator<Item = &(MidiEvent, EventTime)> {
        self.events
            .iter()
            .filter(|(e, _)| matches!(e, MidiEvent::NoteOff { .. }))
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl NoteSink for EventLog {
    fn schedule(&mut self, event: MidiEvent, at: EventTime) {
        self.events.push((event, at));
    }
}

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Note name with octave, e.g. 60 -> "C4"
pub fn note_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i8 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

/// Clamp an arbitrary pitch into the valid MIDI range
pub fn normalize_pitch(pitch: i32) -> u8 {
    pitch.clamp(0, 127) as u8
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
}
