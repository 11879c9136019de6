// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The host callback surface.
//!
//! [`Eggiator`] owns all scheduling state: held notes, the buffer
//! scheduler and its cursor, the parameter registry and the notes that are
//! still sounding. The host drives it through two callbacks, one per
//! incoming MIDI event and one per audio buffer.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::scheduler::{BufferScheduler, NoteLengthUnit, ScheduledNote, SchedulerSettings};
use super::{HeldNotes, NoteOrder};
use crate::config::EngineConfig;
use crate::control::{names, presets, ParameterRegistry};
use crate::error::SchedulerError;
use crate::midi::{EventTime, MidiEvent, NoteSink};
use crate::timing::TimingWindow;

/// Beat-synchronous arpeggiator engine
#[derive(Debug, Clone)]
pub struct Eggiator {
    held: HeldNotes,
    scheduler: BufferScheduler,
    params: ParameterRegistry,
    /// Emitted notes whose release may still be pending
    sounding: Vec<ScheduledNote>,
    was_playing: bool,
}

impl Eggiator {
    /// Create an engine seeded from system entropy
    pub fn new(settings: SchedulerSettings) -> Self {
        Self::with_scheduler(BufferScheduler::new(settings))
    }

    /// Create an engine with a fixed seed
    pub fn with_seed(settings: SchedulerSettings, seed: u64) -> Self {
        Self::with_scheduler(BufferScheduler::with_seed(settings, seed))
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        let settings = config.settings();
        let mut engine = match config.policy.seed {
            Some(seed) => Self::with_seed(settings, seed),
            None => Self::new(settings),
        };
        config.parameters.apply(&mut engine.params);
        engine.apply_parameters();
        engine
    }

    fn with_scheduler(scheduler: BufferScheduler) -> Self {
        let mut params = ParameterRegistry::eggiator();
        let s = scheduler.settings();
        if s.note_length_unit == NoteLengthUnit::Milliseconds {
            params.register(presets::note_length_ms());
        }
        let values = [
            (names::BEAT_DIVISION, s.beat_division as f64),
            (names::NOTES_PER_BEAT, s.notes_per_beat as f64),
            (names::NOTE_ORDER, s.note_order.to_value() as f64),
            (names::SIMULTANEOUS_NOTES, s.simultaneous_notes as f64),
            (names::NOTE_LENGTH, s.note_length),
            (names::RANDOM_LENGTH, s.random_length),
            (names::RANDOM_DELAY, s.random_delay),
            (names::RANDOM_OCTAVE, s.random_octave as f64),
        ];
        for (name, value) in values {
            // Every name above is registered by `eggiator()`
            let _ = params.set(name, value);
        }

        let mut engine = Self {
            held: HeldNotes::new(),
            scheduler,
            params,
            sounding: Vec::new(),
            was_playing: false,
        };
        engine.apply_parameters();
        engine
    }

    /// Current scheduler settings
    pub fn settings(&self) -> &SchedulerSettings {
        self.scheduler.settings()
    }

    /// The scheduler
    pub fn scheduler(&self) -> &BufferScheduler {
        &self.scheduler
    }

    /// The parameter registry
    pub fn parameters(&self) -> &ParameterRegistry {
        &self.params
    }

    /// Read a parameter
    pub fn get_parameter(&self, name: &str) -> Option<f64> {
        self.params.value(name)
    }

    /// Write a parameter; returns the value stored after clamping.
    ///
    /// Takes effect from the next phrase.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, SchedulerError> {
        let stored = self.params.set(name, value)?;
        debug!(name, value = stored, "parameter changed");
        self.apply_parameters();
        Ok(stored)
    }

    fn apply_parameters(&mut self) {
        let p = &self.params;
        let mut s = self.scheduler.settings().clone();
        s.beat_division = p.value_or(names::BEAT_DIVISION, 4.0) as usize;
        s.notes_per_beat = p.value_or(names::NOTES_PER_BEAT, 4.0) as usize;
        s.note_order = NoteOrder::from_value(p.value_or(names::NOTE_ORDER, 0.0) as u8);
        s.simultaneous_notes = p.value_or(names::SIMULTANEOUS_NOTES, 1.0) as usize;
        s.note_length = p.value_or(names::NOTE_LENGTH, 100.0);
        s.random_length = p.value_or(names::RANDOM_LENGTH, 0.0);
        s.random_delay = p.value_or(names::RANDOM_DELAY, 0.0);
        s.random_octave = p.value_or(names::RANDOM_OCTAVE, 1.0) as u8;
        self.scheduler.set_settings(s);
    }

    /// Notes currently held at the input
    pub fn held(&self) -> &HeldNotes {
        &self.held
    }

    /// Emitted notes that may still be sounding
    pub fn sounding(&self) -> &[ScheduledNote] {
        &self.sounding
    }

    /// Whether the last tick saw a running transport
    pub fn is_playing(&self) -> bool {
        self.was_playing
    }

    /// Handle one incoming MIDI event.
    ///
    /// Note events update the held set; anything else goes straight to the
    /// sink. Releasing the last held note resets the scheduling state.
    pub fn on_note_event<S: NoteSink + ?Sized>(&mut self, event: MidiEvent, sink: &mut S) {
        match event {
            MidiEvent::NoteOn {
                channel,
                pitch,
                velocity,
            } if velocity > 0 => {
                self.held.press_on(channel, pitch, velocity);
            }
            MidiEvent::NoteOn { pitch, .. } | MidiEvent::NoteOff { pitch, .. } => {
                if self.held.release(pitch).is_some() && self.held.is_empty() {
                    debug!("all notes released");
                    self.scheduler.reset();
                }
            }
            other @ MidiEvent::Other(_) => sink.schedule(other, EventTime::Now),
        }
    }

    /// Handle one audio buffer.
    ///
    /// `None` means the host gave no timing info and is treated as a
    /// stopped transport. Returns the number of notes scheduled.
    pub fn on_transport_tick<S: NoteSink + ?Sized>(
        &mut self,
        window: Option<&TimingWindow>,
        sink: &mut S,
    ) -> usize {
        if window.is_none() {
            debug!(error = %SchedulerError::MissingTimingInfo, "treating as stopped");
        }
        let Some(window) = window.filter(|w| w.playing) else {
            if self.was_playing {
                info!("transport stopped");
                self.flush(sink);
                self.reset();
            }
            self.was_playing = false;
            return 0;
        };

        if !self.was_playing {
            info!(beat = window.start_beat, tempo = window.tempo, "transport started");
            self.was_playing = true;
        }

        self.sounding.retain(|n| n.release_beat > window.start_beat);

        let notes = self.scheduler.advance(window, &self.held);
        for note in &notes {
            sink.schedule(
                MidiEvent::note_on(note.pitch, note.velocity).with_channel(note.channel),
                EventTime::Beat(note.host_beat),
            );
            sink.schedule(
                MidiEvent::note_off(note.pitch).with_channel(note.channel),
                EventTime::Beat(note.release_beat),
            );
        }
        self.sounding.extend_from_slice(&notes);

        // The host carries on from the loop start; keep releases on its timeline
        if window.wraps() {
            let loop_len = window.loop_length();
            for note in self.sounding.iter_mut() {
                if note.release_beat >= window.loop_end {
                    note.host_beat -= loop_len;
                    note.release_beat -= loop_len;
                }
            }
        }

        notes.len()
    }

    /// Send an immediate note off for every sounding and held pitch
    fn flush<S: NoteSink + ?Sized>(&mut self, sink: &mut S) {
        let mut notes: Vec<(u8, u8)> = self
            .sounding
            .iter()
            .map(|n| (n.channel, n.pitch))
            .chain(self.held.as_slice().iter().map(|n| (n.channel, n.pitch)))
            .collect();
        notes.sort_unstable();
        notes.dedup();

        debug!(count = notes.len(), "flushing note offs");
        for (channel, pitch) in notes {
            sink.schedule(MidiEvent::note_off(pitch).with_channel(channel), EventTime::Now);
        }
        self.sounding.clear();
    }

    /// Clear held notes and all scheduling state together
    pub fn reset(&mut self) {
        info!("reset");
        self.held.clear();
        self.scheduler.reset();
        self.sounding.clear();
    }
}

impl Default for Eggiator {
    fn default() -> Self {
        Self::new(SchedulerSettings::default())
    }
}

/// Thread-safe handle around one [`Eggiator`].
///
/// A single coarse lock serializes the callbacks for hosts that deliver
/// them from more than one thread.
#[derive(Debug, Clone)]
pub struct SharedEggiator {
    inner: Arc<Mutex<Eggiator>>,
}

impl SharedEggiator {
    /// Wrap an engine
    pub fn new(engine: Eggiator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut Eggiator) -> R) -> Result<R, SchedulerError> {
        let mut engine = self.inner.lock().map_err(|_| {
            warn!("engine lock poisoned");
            SchedulerError::LockPoisoned
        })?;
        Ok(f(&mut engine))
    }

    /// See [`Eggiator::on_note_event`]
    pub fn on_note_event<S: NoteSink + ?Sized>(
        &self,
        event: MidiEvent,
        sink: &mut S,
    ) -> Result<(), SchedulerError> {
        self.with(|engine| engine.on_note_event(event, sink))
    }

    /// See [`Eggiator::on_transport_tick`]
    pub fn on_transport_tick<S: NoteSink + ?Sized>(
        &self,
        window: Option<&TimingWindow>,
        sink: &mut S,
    ) -> Result<usize, SchedulerError> {
        self.with(|engine| engine.on_transport_tick(window, sink))
    }

    /// See [`Eggiator::set_parameter`]
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<f64, SchedulerError> {
        self.with(|engine| engine.set_parameter(name, value))?
    }

    /// See [`Eggiator::reset`]
    pub fn reset(&self) -> Result<(), SchedulerError> {
        self.with(|engine| engine.reset())
    }
}
