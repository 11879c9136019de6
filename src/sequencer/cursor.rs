// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat cursor: which offset of the current phrase plays next.
//!
//! The cursor moves through three states:
//!
//! - `AwaitingPattern`: no phrase; the next one is armed lazily once the
//!   playhead reaches `next_anchor` (or the current beat after a reset).
//! - `Armed`: a phrase is anchored at a host beat and nothing has played.
//! - `Emitting`: at least one note of the phrase has played.
//!
//! Consuming the last offset returns the cursor to `AwaitingPattern` with
//! the following beat as its next anchor. A cycle wrap is also a new beat:
//! the next phrase anchors on the loop start.

use crate::generators::Phrase;

/// Cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    AwaitingPattern,
    Armed,
    Emitting,
}

/// Scheduling cursor over one phrase
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeatCursor {
    state: CursorState,
    /// Current pattern and its offsets
    phrase: Phrase,
    /// Offsets of `phrase` converted to beats
    beat_offsets: Vec<f64>,
    /// Host beat where the phrase's beat starts
    anchor: f64,
    /// Index of the next offset to play
    position: usize,
    /// Beats played so far with the current pattern
    phrase_beat: u32,
    /// Where the next phrase starts, once this one is done
    next_anchor: Option<f64>,
}

impl BeatCursor {
    /// Create an idle cursor
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Whether a phrase is loaded
    pub fn is_armed(&self) -> bool {
        self.state != CursorState::AwaitingPattern
    }

    /// Current phrase (empty while awaiting)
    pub fn phrase(&self) -> &Phrase {
        &self.phrase
    }

    /// Phrase offsets in beats
    pub fn beat_offsets(&self) -> &[f64] {
        &self.beat_offsets
    }

    /// Host beat the phrase is anchored at
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Index of the next offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Beats already played with the current pattern
    pub fn phrase_beat(&self) -> u32 {
        self.phrase_beat
    }

    /// Anchor for the next phrase, if one is pending
    pub fn next_anchor(&self) -> Option<f64> {
        self.next_anchor
    }

    /// Load a new phrase anchored at `anchor`
    pub fn arm(&mut self, phrase: Phrase, anchor: f64, tempo: f64, downbeat_epsilon: f64) {
        self.phrase = phrase;
        self.phrase_beat = 0;
        self.load(anchor, tempo, downbeat_epsilon);
    }

    /// Play the current pattern again, one beat later in the phrase
    pub fn repeat(&mut self, anchor: f64, tempo: f64, downbeat_epsilon: f64) {
        self.phrase_beat += 1;
        self.load(anchor, tempo, downbeat_epsilon);
    }

    fn load(&mut self, anchor: f64, tempo: f64, downbeat_epsilon: f64) {
        self.phrase
            .offsets()
            .fill_beats(tempo, downbeat_epsilon, &mut self.beat_offsets);
        self.anchor = anchor;
        self.position = 0;
        self.next_anchor = None;
        self.state = if self.beat_offsets.is_empty() {
            CursorState::AwaitingPattern
        } else {
            CursorState::Armed
        };
    }

    /// Recompute beat offsets at a new tempo; only millisecond offsets move
    pub fn refresh(&mut self, tempo: f64, downbeat_epsilon: f64) {
        if self.is_armed() {
            self.phrase
                .offsets()
                .fill_beats(tempo, downbeat_epsilon, &mut self.beat_offsets);
        }
    }

    /// Host beat of the next note, if armed
    pub fn next_beat(&self) -> Option<f64> {
        if !self.is_armed() {
            return None;
        }
        self.beat_offsets.get(self.position).map(|o| self.anchor + o)
    }

    /// Mark the next note as played.
    ///
    /// Returns true if that was the last note of the phrase.
    pub fn consume(&mut self) -> bool {
        self.state = CursorState::Emitting;
        self.step()
    }

    /// Pass over the next note without playing it.
    ///
    /// Returns true if that was the last note of the phrase.
    pub fn skip(&mut self) -> bool {
        self.step()
    }

    fn step(&mut self) -> bool {
        self.position += 1;
        if self.position >= self.beat_offsets.len() {
            self.finish();
            return true;
        }
        false
    }

    /// End the phrase; the next one starts on the following beat
    pub fn finish(&mut self) {
        self.state = CursorState::AwaitingPattern;
        self.position = 0;
        self.next_anchor = Some(self.anchor + 1.0);
    }

    /// Drop the phrase without a pending anchor; the next one anchors on
    /// whatever beat the playhead is in.
    pub fn abandon(&mut self) {
        self.state = CursorState::AwaitingPattern;
        self.position = 0;
        self.next_anchor = None;
    }

    /// Start over after the playhead wraps to `loop_start`.
    ///
    /// Notes still pending lie at or past the loop end and are never
    /// reached. The phrase is dropped so the next one is drawn fresh and
    /// anchored on `loop_start`; later beats follow on the loop's grid.
    pub fn wrap(&mut self, loop_start: f64) {
        self.state = CursorState::AwaitingPattern;
        self.phrase = Phrase::default();
        self.beat_offsets.clear();
        self.position = 0;
        self.phrase_beat = 0;
        self.next_anchor = Some(loop_start);
    }

    /// Return to the initial idle state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
