// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-buffer note scheduler.
//!
//! Once per host buffer the scheduler walks the cursor through the
//! buffer's timing window and emits every note whose beat position lands
//! inside it. A buffer that crosses the loop end is handled as two
//! segments: the part up to the loop end, then the part replayed from the
//! loop start, where a fresh phrase starts on the loop start.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::cursor::{BeatCursor, CursorState};
use super::selection::{slot_step, NoteOrder};
use super::HeldNotes;
use crate::generators::{clamp_active, OffsetUnit, Phrase};
use crate::midi::{normalize_pitch, note_name};
use crate::timing::{Segment, TimingWindow};

/// Slack for beat comparisons, so accumulated float error never moves a
/// note into the wrong buffer
const BEAT_EPSILON: f64 = 1e-9;

/// Shortest note the scheduler will emit, in beats
const MIN_NOTE_BEATS: f64 = 0.001;

/// When a finished phrase is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmMode {
    /// Generate the next phrase when the playhead reaches the next beat
    Lazy,
    /// Generate the next phrase as soon as the last note is emitted
    Immediate,
    /// Immediate with one note per beat, lazy otherwise
    #[default]
    SingleNoteImmediate,
}

impl RearmMode {
    /// Whether to re-arm right after the last note of a phrase
    pub fn is_immediate(self, notes_per_beat: usize) -> bool {
        match self {
            RearmMode::Lazy => false,
            RearmMode::Immediate => true,
            RearmMode::SingleNoteImmediate => notes_per_beat == 1,
        }
    }
}

/// How often phrase offsets are converted to beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetRefresh {
    /// Once, when the phrase is armed
    #[default]
    PerPhrase,
    /// At the start of every buffer, following tempo changes
    EveryBuffer,
}

/// Unit of the note length parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteLengthUnit {
    /// Percent of one subdivision
    #[default]
    Percent,
    /// Milliseconds at the current tempo
    Milliseconds,
}

/// Everything the scheduler needs to place notes
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    /// Subdivisions per beat
    pub beat_division: usize,
    /// Active subdivisions per beat
    pub notes_per_beat: usize,
    /// Held note order
    pub note_order: NoteOrder,
    /// Notes sounded per slot
    pub simultaneous_notes: usize,
    /// Note length, in `note_length_unit`
    pub note_length: f64,
    /// Unit of `note_length`
    pub note_length_unit: NoteLengthUnit,
    /// Length jitter, percent of a subdivision
    pub random_length: f64,
    /// Delay jitter, percent of a subdivision
    pub random_delay: f64,
    /// Octave spread; 1 means no shift
    pub random_octave: u8,
    /// Unit phrase offsets are computed in
    pub offset_unit: OffsetUnit,
    /// Replacement for a zero offset, in beats
    pub downbeat_epsilon: f64,
    /// When finished phrases are replaced
    pub rearm: RearmMode,
    /// When offsets follow tempo changes
    pub offset_refresh: OffsetRefresh,
    /// Beats a pattern is repeated for before a new one is drawn
    pub beats_per_phrase: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            beat_division: 4,
            notes_per_beat: 4,
            note_order: NoteOrder::Up,
            simultaneous_notes: 1,
            note_length: 100.0,
            note_length_unit: NoteLengthUnit::Percent,
            random_length: 0.0,
            random_delay: 0.0,
            random_octave: 1,
            offset_unit: OffsetUnit::Beats,
            downbeat_epsilon: 0.0,
            rearm: RearmMode::SingleNoteImmediate,
            offset_refresh: OffsetRefresh::PerPhrase,
            beats_per_phrase: 1,
        }
    }
}

impl SchedulerSettings {
    /// Settings with the given division and notes per beat
    pub fn with_pattern(mut self, beat_division: usize, notes_per_beat: usize) -> Self {
        self.beat_division = beat_division;
        self.notes_per_beat = notes_per_beat;
        self
    }

    /// Settings with the given note order
    pub fn with_order(mut self, order: NoteOrder) -> Self {
        self.note_order = order;
        self
    }

    /// Settings with the given re-arm mode
    pub fn with_rearm(mut self, rearm: RearmMode) -> Self {
        self.rearm = rearm;
        self
    }

    /// Bring every field into its usable range
    pub fn normalized(mut self) -> Self {
        self.beat_division = self.beat_division.max(1);
        self.notes_per_beat = clamp_active(self.beat_division, self.notes_per_beat);
        self.simultaneous_notes = self.simultaneous_notes.max(1);
        self.note_length = self.note_length.max(0.0);
        self.random_length = self.random_length.max(0.0);
        self.random_delay = self.random_delay.max(0.0);
        self.random_octave = self.random_octave.max(1);
        self.downbeat_epsilon = self.downbeat_epsilon.max(0.0);
        self.beats_per_phrase = self.beats_per_phrase.max(1);
        self
    }

    /// Length of one subdivision in beats
    pub fn slot_beats(&self) -> f64 {
        1.0 / self.beat_division.max(1) as f64
    }

    /// Base note length in beats at the given tempo
    pub fn note_length_beats(&self, tempo: f64) -> f64 {
        match self.note_length_unit {
            NoteLengthUnit::Percent => self.note_length / 100.0 * self.slot_beats(),
            NoteLengthUnit::Milliseconds => self.note_length * tempo / 60_000.0,
        }
    }
}

/// One note the host should play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    /// Output channel, taken from the held note
    pub channel: u8,
    /// Output pitch
    pub pitch: u8,
    /// Output velocity
    pub velocity: u8,
    /// Note-on position on the unwrapped timeline of the window
    pub beat: f64,
    /// Note-on position in host beats, after loop remapping
    pub host_beat: f64,
    /// Note-off position in host beats
    pub release_beat: f64,
    /// Note length at the window tempo
    pub length_ms: f64,
}

impl ScheduledNote {
    /// Note length in beats
    pub fn length_beats(&self) -> f64 {
        self.release_beat - self.host_beat
    }
}

/// Turns timing windows into scheduled notes
#[derive(Debug, Clone)]
pub struct BufferScheduler {
    cursor: BeatCursor,
    settings: SchedulerSettings,
    rng: StdRng,
}

impl BufferScheduler {
    /// Create a scheduler seeded from system entropy
    pub fn new(settings: SchedulerSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Create a scheduler with a fixed seed
    pub fn with_seed(settings: SchedulerSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    /// Create a scheduler with an explicit random source
    pub fn with_rng(settings: SchedulerSettings, rng: StdRng) -> Self {
        Self {
            cursor: BeatCursor::new(),
            settings: settings.normalized(),
            rng,
        }
    }

    /// Current settings
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Replace the settings; the current phrase plays out unchanged
    pub fn set_settings(&mut self, settings: SchedulerSettings) {
        self.settings = settings.normalized();
    }

    /// The cursor
    pub fn cursor(&self) -> &BeatCursor {
        &self.cursor
    }

    /// Load a specific phrase at `anchor`, bypassing generation
    pub fn arm_with(&mut self, phrase: Phrase, anchor: f64, tempo: f64) {
        self.cursor
            .arm(phrase, anchor, tempo, self.settings.downbeat_epsilon);
    }

    /// Drop the phrase and return to the initial state
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Emit every note that falls inside `window`.
    ///
    /// An unusable window or an empty held set produces nothing and leaves
    /// the cursor untouched.
    pub fn advance(&mut self, window: &TimingWindow, held: &HeldNotes) -> Vec<ScheduledNote> {
        let mut out = Vec::new();

        if let Err(e) = window.validate() {
            debug!(error = %e, "skipping buffer");
            return out;
        }
        if held.is_empty() {
            return out;
        }

        let (first, wrapped) = window.segments();
        self.run_segment(&first, window, held, &mut out);
        if let Some(second) = wrapped {
            trace!(loop_start = window.loop_start, "cycle wrap");
            self.cursor.wrap(window.loop_start);
            self.run_segment(&second, window, held, &mut out);
        }

        out
    }

    fn run_segment(
        &mut self,
        seg: &Segment,
        window: &TimingWindow,
        held: &HeldNotes,
        out: &mut Vec<ScheduledNote>,
    ) {
        if self.settings.offset_refresh == OffsetRefresh::EveryBuffer {
            self.cursor
                .refresh(window.tempo, self.settings.downbeat_epsilon);
        }

        let mut budget = self.iteration_budget(seg);
        loop {
            if budget == 0 {
                warn!(
                    start = seg.start,
                    end = seg.end,
                    "iteration limit reached, dropping rest of buffer"
                );
                return;
            }
            budget -= 1;

            match self.cursor.state() {
                CursorState::AwaitingPattern => {
                    let floor_start = seg.start.floor();
                    let (anchor, fresh) = match self.cursor.next_anchor() {
                        // Transport jumped backwards past the pending anchor
                        Some(a) if a > seg.start + 1.0 + BEAT_EPSILON => (floor_start, true),
                        // Transport jumped forwards past the pending beat
                        Some(a) if a + 1.0 <= seg.start + BEAT_EPSILON => (floor_start, true),
                        Some(a) => (a, false),
                        None => (floor_start, true),
                    };
                    if anchor >= seg.end - BEAT_EPSILON {
                        return;
                    }

                    self.arm(anchor, fresh, window.tempo);
                    while let Some(next) = self.cursor.next_beat() {
                        if next >= seg.start - BEAT_EPSILON {
                            break;
                        }
                        self.cursor.skip();
                    }
                }
                CursorState::Armed | CursorState::Emitting => {
                    let anchor = self.cursor.anchor();
                    let Some(next) = self.cursor.next_beat() else {
                        self.cursor.abandon();
                        continue;
                    };

                    if seg.start + 1.0 + BEAT_EPSILON < anchor {
                        debug!(anchor, start = seg.start, "transport moved back, dropping phrase");
                        self.cursor.abandon();
                        continue;
                    }

                    if next < seg.start - BEAT_EPSILON {
                        if seg.start >= anchor + 1.0 - BEAT_EPSILON {
                            debug!(anchor, start = seg.start, "stale phrase, regenerating");
                            self.cursor.abandon();
                        } else {
                            debug!(beat = next, start = seg.start, "skipping late note");
                            self.cursor.skip();
                        }
                        continue;
                    }

                    if next >= seg.end - BEAT_EPSILON {
                        return;
                    }

                    self.emit(next, seg, window, held, out);
                    let exhausted = self.cursor.consume();
                    if exhausted && self.settings.rearm.is_immediate(self.settings.notes_per_beat) {
                        self.arm(anchor + 1.0, false, window.tempo);
                    }
                }
            }
        }
    }

    /// Upper bound on loop iterations for one segment: every beat it
    /// touches can arm once and play or skip each subdivision once.
    fn iteration_budget(&self, seg: &Segment) -> usize {
        let beats = ((seg.end - seg.start).max(0.0).ceil() as usize).saturating_add(2);
        beats
            .saturating_mul(self.settings.beat_division.saturating_add(2))
            .saturating_mul(2)
            .saturating_add(8)
    }

    fn arm(&mut self, anchor: f64, fresh: bool, tempo: f64) {
        let s = &self.settings;
        let current = self.cursor.phrase().pattern();
        let repeatable = !fresh
            && self.cursor.phrase_beat() + 1 < s.beats_per_phrase
            && current.len() == s.beat_division
            && current.active_count() == s.notes_per_beat;

        if repeatable {
            self.cursor.repeat(anchor, tempo, s.downbeat_epsilon);
            return;
        }

        let phrase = Phrase::generate(
            &mut self.rng,
            s.beat_division,
            s.notes_per_beat,
            s.offset_unit,
            tempo,
        );
        debug!(
            anchor,
            pattern = %phrase.pattern(),
            offsets = ?phrase.offsets().values(),
            "new phrase"
        );
        let epsilon = s.downbeat_epsilon;
        self.cursor.arm(phrase, anchor, tempo, epsilon);
    }

    fn emit(
        &mut self,
        host_beat: f64,
        seg: &Segment,
        window: &TimingWindow,
        held: &HeldNotes,
        out: &mut Vec<ScheduledNote>,
    ) {
        let s = &self.settings;
        let step = slot_step(host_beat, s.beat_division);
        let notes = match s
            .note_order
            .select(held.as_slice(), step, s.simultaneous_notes, &mut self.rng)
        {
            Ok(notes) => notes,
            Err(e) => {
                debug!(error = %e, "no note selected");
                return;
            }
        };

        let slot = s.slot_beats();
        let base_length = s.note_length_beats(window.tempo);
        for note in notes {
            let delay = jitter(&mut self.rng, s.random_delay) * slot;
            let length = (base_length + jitter(&mut self.rng, s.random_length) * slot)
                .max(MIN_NOTE_BEATS);
            let octave = if s.random_octave > 1 {
                self.rng.gen_range(0..s.random_octave) as i32 * 12
            } else {
                0
            };
            let pitch = normalize_pitch(note.pitch as i32 + octave);
            let on = host_beat + delay;

            trace!(
                note = %note_name(pitch),
                beat = on + seg.shift,
                host_beat = on,
                window_start = window.start_beat,
                window_end = window.end_beat,
                "note"
            );
            out.push(ScheduledNote {
                channel: note.channel,
                pitch,
                velocity: note.velocity,
                beat: on + seg.shift,
                host_beat: on,
                release_beat: on + length,
                length_ms: window.beats_to_ms(length),
            });
        }
    }
}

/// Random fraction in `[0, percent / 100)`; zero without drawing when the
/// amount is zero
fn jitter<R: Rng + ?Sized>(rng: &mut R, percent: f64) -> f64 {
    if percent <= 0.0 {
        return 0.0;
    }
    rng.gen::<f64>() * percent / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::RhythmPattern;
    use crate::timing::SimulatedTransport;

    fn held(pitches: &[u8]) -> HeldNotes {
        let mut held = HeldNotes::new();
        for &p in pitches {
            held.press(p, 100);
        }
        held
    }

    fn phrase(slots: &[u8]) -> Phrase {
        let pattern = RhythmPattern::from_slots(slots.iter().map(|&s| s == 1).collect());
        Phrase::from_pattern(pattern, OffsetUnit::Beats, 120.0)
    }

    fn beats(notes: &[ScheduledNote]) -> Vec<f64> {
        notes.iter().map(|n| n.beat).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_whole_beat_window() {
        let settings = SchedulerSettings::default().with_pattern(2, 2);
        let mut scheduler = BufferScheduler::with_seed(settings, 1);
        scheduler.arm_with(phrase(&[1, 1]), 0.0, 120.0);

        let notes = scheduler.advance(&TimingWindow::new(0.0, 1.0, 120.0), &held(&[60]));
        assert_eq!(beats(&notes), vec![0.0, 0.5]);
    }

    #[test]
    fn test_short_window_emits_first_note_only() {
        let settings = SchedulerSettings::default().with_pattern(2, 2);
        let mut scheduler = BufferScheduler::with_seed(settings, 1);
        scheduler.arm_with(phrase(&[1, 1]), 0.0, 120.0);

        let notes = scheduler.advance(&TimingWindow::new(0.0, 0.3, 120.0), &held(&[60]));
        assert_eq!(beats(&notes), vec![0.0]);
        assert_eq!(scheduler.cursor().state(), CursorState::Emitting);
        assert_eq!(scheduler.cursor().position(), 1);

        let notes = scheduler.advance(&TimingWindow::new(0.3, 0.6, 120.0), &held(&[60]));
        assert_eq!(beats(&notes), vec![0.5]);
    }

    #[test]
    fn test_four_of_four_over_small_buffers() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 3);
        let notes = held(&[60]);

        let mut emitted = Vec::new();
        let step = 0.05;
        for i in 0..40 {
            let start = i as f64 * step;
            let window = TimingWindow::new(start, start + step, 120.0);
            emitted.extend(scheduler.advance(&window, &notes));
        }

        let expected = [0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75];
        assert_eq!(emitted.len(), expected.len());
        for (note, want) in emitted.iter().zip(expected) {
            assert!(approx(note.beat, want), "{} != {}", note.beat, want);
        }
    }

    #[test]
    fn test_loop_wraparound_keeps_notes() {
        let settings = SchedulerSettings::default().with_pattern(10, 10);
        let mut scheduler = BufferScheduler::with_seed(settings, 4);

        let window = TimingWindow::new(1.8, 2.2, 120.0).with_loop(0.0, 2.0);
        let notes = scheduler.advance(&window, &held(&[60]));

        let expected = [1.8, 1.9, 2.0, 2.1];
        assert_eq!(notes.len(), expected.len());
        for (note, want) in notes.iter().zip(expected) {
            assert!(approx(note.beat, want), "{} != {}", note.beat, want);
        }
        assert!(approx(notes[3].host_beat, 0.1));
        assert!(approx(notes[2].host_beat, 0.0));
    }

    #[test]
    fn test_buffer_ending_on_loop_end_wraps() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 4);
        let notes = held(&[60]);

        let window = TimingWindow::new(1.25, 1.5, 120.0).with_loop(0.0, 1.5);
        assert_eq!(beats(&scheduler.advance(&window, &notes)), vec![1.25]);

        // The pending beat at 1.5 is never reached; play resumes at the loop start
        assert_eq!(scheduler.cursor().next_anchor(), Some(0.0));
        let window = TimingWindow::new(0.0, 0.25, 120.0).with_loop(0.0, 1.5);
        assert_eq!(beats(&scheduler.advance(&window, &notes)), vec![0.0]);
    }

    #[test]
    fn test_wrap_restarts_phrase_on_loop_start() {
        let settings = SchedulerSettings::default().with_pattern(3, 3);
        let mut scheduler = BufferScheduler::with_seed(settings, 4);
        let notes = held(&[60]);

        // 0.2 beat buffers over a 1.5 beat cycle
        let mut transport = SimulatedTransport::new(120.0, 1_000, 100);
        transport.set_cycle(0.0, 1.5);
        transport.start();

        let mut passes: Vec<Vec<f64>> = vec![Vec::new()];
        let mut last = f64::NEG_INFINITY;
        for _ in 0..30 {
            let window = transport.next_window();
            for note in scheduler.advance(&window, &notes) {
                if note.host_beat < last {
                    passes.push(Vec::new());
                }
                last = note.host_beat;
                if let Some(pass) = passes.last_mut() {
                    pass.push(note.host_beat);
                }
            }
        }

        let grid = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 4.0 / 3.0];
        assert!(passes.len() >= 3);
        for pass in &passes[..3] {
            assert_eq!(pass.len(), grid.len(), "pass {:?}", pass);
            for (beat, want) in pass.iter().zip(grid) {
                assert!(approx(*beat, want), "{} != {}", beat, want);
            }
        }
    }

    #[test]
    fn test_loop_on_half_beat_keeps_its_grid() {
        let settings = SchedulerSettings::default()
            .with_pattern(2, 2)
            .with_rearm(RearmMode::Lazy);
        let mut scheduler = BufferScheduler::with_seed(settings, 4);
        let notes = held(&[60]);

        // Cycle 0.5..2.5: after the wrap, beats are counted from 0.5
        let window = TimingWindow::new(2.25, 2.75, 120.0).with_loop(0.5, 2.5);
        let emitted = scheduler.advance(&window, &notes);
        let host: Vec<f64> = emitted.iter().map(|n| n.host_beat).collect();
        assert_eq!(host, vec![0.5]);

        let window = TimingWindow::new(0.75, 1.75, 120.0).with_loop(0.5, 2.5);
        let host: Vec<f64> = scheduler
            .advance(&window, &notes)
            .iter()
            .map(|n| n.host_beat)
            .collect();
        assert_eq!(host, vec![1.0, 1.5]);
    }

    #[test]
    fn test_huge_window_does_not_overflow_budget() {
        let scheduler = BufferScheduler::with_seed(SchedulerSettings::default(), 4);
        let seg = Segment {
            start: 0.0,
            end: 1e300,
            shift: 0.0,
            wrapped: false,
        };
        assert_eq!(scheduler.iteration_budget(&seg), usize::MAX);
    }

    #[test]
    fn test_empty_window_leaves_state_alone() {
        let settings = SchedulerSettings::default().with_pattern(2, 2);
        let mut scheduler = BufferScheduler::with_seed(settings, 5);
        scheduler.arm_with(phrase(&[1, 1]), 0.0, 120.0);
        let notes = held(&[60]);

        scheduler.advance(&TimingWindow::new(0.0, 0.1, 120.0), &notes);
        let before = scheduler.cursor().clone();

        let emitted = scheduler.advance(&TimingWindow::new(0.1, 0.4, 120.0), &notes);
        assert!(emitted.is_empty());
        assert_eq!(scheduler.cursor(), &before);

        let emitted = scheduler.advance(&TimingWindow::new(0.4, 0.45, 120.0), &notes);
        assert!(emitted.is_empty());
        assert_eq!(scheduler.cursor(), &before);
    }

    #[test]
    fn test_awaiting_window_leaves_state_alone() {
        let settings = SchedulerSettings::default()
            .with_pattern(2, 2)
            .with_rearm(RearmMode::Lazy);
        let mut scheduler = BufferScheduler::with_seed(settings, 5);
        scheduler.arm_with(phrase(&[1, 1]), 0.0, 120.0);
        let notes = held(&[60]);

        scheduler.advance(&TimingWindow::new(0.0, 0.9, 120.0), &notes);
        assert_eq!(scheduler.cursor().state(), CursorState::AwaitingPattern);
        let before = scheduler.cursor().clone();

        let emitted = scheduler.advance(&TimingWindow::new(0.9, 0.95, 120.0), &notes);
        assert!(emitted.is_empty());
        assert_eq!(scheduler.cursor(), &before);
    }

    #[test]
    fn test_degenerate_window_skipped() {
        let mut scheduler = BufferScheduler::with_seed(SchedulerSettings::default(), 6);
        let before = scheduler.cursor().clone();
        let notes = scheduler.advance(&TimingWindow::new(1.0, 1.0, 120.0), &held(&[60]));
        assert!(notes.is_empty());
        assert_eq!(scheduler.cursor(), &before);

        let notes = scheduler.advance(&TimingWindow::new(2.0, 1.0, 120.0), &held(&[60]));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_empty_held_notes_skipped() {
        let mut scheduler = BufferScheduler::with_seed(SchedulerSettings::default(), 7);
        let notes = scheduler.advance(&TimingWindow::new(0.0, 1.0, 120.0), &HeldNotes::new());
        assert!(notes.is_empty());
        assert_eq!(scheduler.cursor().state(), CursorState::AwaitingPattern);
    }

    #[test]
    fn test_late_join_skips_passed_offsets() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 8);
        let notes = scheduler.advance(&TimingWindow::new(3.6, 4.0, 120.0), &held(&[60]));
        assert_eq!(beats(&notes), vec![3.75]);
    }

    #[test]
    fn test_single_note_rearms_immediately() {
        let settings = SchedulerSettings::default().with_pattern(4, 1);
        let mut scheduler = BufferScheduler::with_seed(settings, 9);
        let notes = held(&[60]);

        let mut per_beat = [0usize; 8];
        for i in 0..64 {
            let start = i as f64 * 0.125;
            let window = TimingWindow::new(start, start + 0.125, 120.0);
            for note in scheduler.advance(&window, &notes) {
                per_beat[note.beat.floor() as usize] += 1;
            }
            // Never waits in the idle state once the first note plays
            if i > 8 {
                assert!(scheduler.cursor().is_armed());
            }
        }
        assert_eq!(per_beat, [1; 8]);
    }

    #[test]
    fn test_lazy_rearm_waits_for_next_beat() {
        let settings = SchedulerSettings::default()
            .with_pattern(4, 1)
            .with_rearm(RearmMode::Lazy);
        let mut scheduler = BufferScheduler::with_seed(settings, 9);
        let notes = held(&[60]);

        let mut total = 0;
        for i in 0..32 {
            let start = i as f64 * 0.25;
            let window = TimingWindow::new(start, start + 0.25, 120.0);
            total += scheduler.advance(&window, &notes).len();
        }
        assert_eq!(total, 8);
    }

    #[test]
    fn test_pattern_regenerates_every_beat() {
        let settings = SchedulerSettings::default().with_pattern(16, 3);
        let mut scheduler = BufferScheduler::with_seed(settings, 10);
        let notes = held(&[60]);

        let mut patterns = Vec::new();
        for beat in 0..20 {
            let window = TimingWindow::new(beat as f64, beat as f64 + 1.0, 120.0);
            assert_eq!(scheduler.advance(&window, &notes).len(), 3);
            patterns.push(scheduler.cursor().phrase().pattern().clone());
        }
        patterns.dedup();
        assert!(patterns.len() > 1);
    }

    #[test]
    fn test_multi_beat_phrase_repeats_pattern() {
        let mut settings = SchedulerSettings::default().with_pattern(16, 3);
        settings.beats_per_phrase = 4;
        let mut scheduler = BufferScheduler::with_seed(settings, 11);
        let notes = held(&[60]);

        let mut fractions = Vec::new();
        for beat in 0..4 {
            let window = TimingWindow::new(beat as f64, beat as f64 + 1.0, 120.0);
            let emitted = scheduler.advance(&window, &notes);
            fractions.push(emitted.iter().map(|n| n.beat.fract()).collect::<Vec<_>>());
        }
        assert!(fractions.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_note_order_up_across_beats() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 12);
        let window = TimingWindow::new(0.0, 2.0, 120.0);
        let pitches: Vec<u8> = scheduler
            .advance(&window, &held(&[60, 64, 67]))
            .iter()
            .map(|n| n.pitch)
            .collect();
        assert_eq!(pitches, vec![60, 64, 67, 60, 64, 67, 60, 64]);
    }

    #[test]
    fn test_simultaneous_notes_share_a_slot() {
        let mut settings = SchedulerSettings::default().with_pattern(2, 2);
        settings.simultaneous_notes = 3;
        let mut scheduler = BufferScheduler::with_seed(settings, 13);
        let notes = scheduler.advance(&TimingWindow::new(0.0, 1.0, 120.0), &held(&[60, 64]));

        // Capped at the number of held notes
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].beat, notes[1].beat);
        assert_ne!(notes[0].pitch, notes[1].pitch);
    }

    #[test]
    fn test_note_off_after_note_on() {
        let mut settings = SchedulerSettings::default().with_pattern(4, 4);
        settings.random_length = 150.0;
        settings.random_delay = 80.0;
        let mut scheduler = BufferScheduler::with_seed(settings, 14);
        let notes = scheduler.advance(&TimingWindow::new(0.0, 4.0, 90.0), &held(&[60, 62]));

        assert_eq!(notes.len(), 16);
        for note in &notes {
            assert!(note.release_beat > note.host_beat);
            assert!(note.length_beats() >= 0.25 && note.length_beats() <= 0.25 + 0.375);
            let slot = slot_step(note.host_beat, 4) as f64 * 0.25;
            assert!(note.host_beat - slot < 0.25 * 0.8 + 1e-9);
        }
    }

    #[test]
    fn test_note_length_units() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        assert!(approx(settings.note_length_beats(120.0), 0.25));

        let mut settings = SchedulerSettings::default();
        settings.note_length_unit = NoteLengthUnit::Milliseconds;
        settings.note_length = 250.0;
        assert!(approx(settings.note_length_beats(120.0), 0.5));

        let mut scheduler = BufferScheduler::with_seed(settings, 15);
        let notes = scheduler.advance(&TimingWindow::new(0.0, 0.2, 120.0), &held(&[60]));
        assert!(approx(notes[0].length_ms, 250.0));
    }

    #[test]
    fn test_random_octave_spread() {
        let mut settings = SchedulerSettings::default().with_pattern(4, 4);
        settings.random_octave = 3;
        let mut scheduler = BufferScheduler::with_seed(settings, 16);
        let notes = scheduler.advance(&TimingWindow::new(0.0, 16.0, 120.0), &held(&[60]));

        for note in &notes {
            assert!([60, 72, 84].contains(&note.pitch));
        }
        assert!(notes.iter().any(|n| n.pitch != 60));
    }

    #[test]
    fn test_backward_jump_regenerates() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 17);
        let notes = held(&[60]);

        scheduler.advance(&TimingWindow::new(8.0, 8.3, 120.0), &notes);
        let emitted = scheduler.advance(&TimingWindow::new(2.0, 2.3, 120.0), &notes);
        assert_eq!(beats(&emitted), vec![2.0, 2.25]);
    }

    #[test]
    fn test_forward_jump_regenerates() {
        let settings = SchedulerSettings::default().with_pattern(4, 4);
        let mut scheduler = BufferScheduler::with_seed(settings, 18);
        let notes = held(&[60]);

        scheduler.advance(&TimingWindow::new(0.0, 0.3, 120.0), &notes);
        let emitted = scheduler.advance(&TimingWindow::new(5.4, 5.6, 120.0), &notes);
        assert_eq!(beats(&emitted), vec![5.5]);
    }

    #[test]
    fn test_normalized_settings() {
        let settings = SchedulerSettings {
            beat_division: 0,
            notes_per_beat: 9,
            simultaneous_notes: 0,
            random_octave: 0,
            beats_per_phrase: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(settings.beat_division, 1);
        assert_eq!(settings.notes_per_beat, 1);
        assert_eq!(settings.simultaneous_notes, 1);
        assert_eq!(settings.random_octave, 1);
        assert_eq!(settings.beats_per_phrase, 1);
    }

    #[test]
    fn test_rearm_modes() {
        assert!(!RearmMode::Lazy.is_immediate(1));
        assert!(RearmMode::Immediate.is_immediate(4));
        assert!(RearmMode::SingleNoteImmediate.is_immediate(1));
        assert!(!RearmMode::SingleNoteImmediate.is_immediate(2));
    }
}
