// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The set of input notes currently held down.

/// One held input note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldNote {
    /// MIDI channel the note arrived on (0-15)
    pub channel: u8,
    /// MIDI pitch (0-127)
    pub pitch: u8,
    /// Note-on velocity
    pub velocity: u8,
    /// Arrival order; larger is later
    pub received_at: u64,
}

/// Held notes kept sorted by pitch, ascending.
///
/// Duplicate pitches are allowed; a release removes the earliest one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeldNotes {
    notes: Vec<HeldNote>,
    arrivals: u64,
}

impl HeldNotes {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a note on from channel 0
    pub fn press(&mut self, pitch: u8, velocity: u8) {
        self.press_on(0, pitch, velocity);
    }

    /// Record a note on from `channel`
    pub fn press_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        let note = HeldNote {
            channel: channel & 0x0F,
            pitch: pitch & 0x7F,
            velocity,
            received_at: self.arrivals,
        };
        self.arrivals += 1;

        // After any equal pitches, so earlier arrivals release first
        let idx = self.notes.partition_point(|n| n.pitch <= note.pitch);
        self.notes.insert(idx, note);
    }

    /// Record a note off; removes the first held note with this pitch
    pub fn release(&mut self, pitch: u8) -> Option<HeldNote> {
        let idx = self.notes.iter().position(|n| n.pitch == pitch)?;
        Some(self.notes.remove(idx))
    }

    /// Drop every held note
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Number of held notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if nothing is held
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Held notes, ascending by pitch
    pub fn as_slice(&self) -> &[HeldNote] {
        &self.notes
    }

    /// Held pitches, ascending
    pub fn pitches(&self) -> impl Iterator<Item = u8> + '_ {
        self.notes.iter().map(|n| n.pitch)
    }
}
