// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Named parameter surface.
//!
//! Provides a registry of named parameters with ranges, integer stepping
//! and menu labels, plus the explicit constraint between beat division and
//! notes per beat.

use std::collections::HashMap;

use crate::error::SchedulerError;

/// Parameter names as shown to the host
pub mod names {
    pub const BEAT_DIVISION: &str = "Beat Division";
    pub const NOTES_PER_BEAT: &str = "Notes Per Beat";
    pub const NOTE_ORDER: &str = "Note Order";
    pub const SIMULTANEOUS_NOTES: &str = "Simultaneous Notes";
    pub const NOTE_LENGTH: &str = "Note Length";
    pub const RANDOM_LENGTH: &str = "Random Length";
    pub const RANDOM_DELAY: &str = "Random Delay";
    pub const RANDOM_OCTAVE: &str = "Random Octave";
    pub const OCTAVE: &str = "Octave";
    pub const ACCELERANDO: &str = "Accelerando";
    pub const DIMINUENDO: &str = "Diminuendo";
}

/// One host-visible control with its range and display hints
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    value: f64,
    /// Display suffix such as "%" or "ms"
    pub unit: String,
    /// Decimal places shown by [`Parameter::format`]
    pub precision: u8,
    pub group: String,
    /// Whether values snap to whole numbers
    pub stepped: bool,
    /// Menu entries, indexed by value
    pub labels: Vec<String>,
}

impl Parameter {
    /// Parameter starting at `default`, clamped into `min..=max`
    pub fn new(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
            value: default.clamp(min, max),
            unit: String::new(),
            precision: 0,
            group: "General".to_string(),
            stepped: false,
            labels: Vec::new(),
        }
    }

    /// Display suffix
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Category the host lists this parameter under
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Snap values to whole numbers
    pub fn stepped(mut self) -> Self {
        self.stepped = true;
        self.value = self.value.round();
        self
    }

    /// Make this a menu with one entry per label
    pub fn menu(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self.stepped()
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Set value (clamped to range, rounded if stepped); returns the value
    /// actually stored
    pub fn set(&mut self, value: f64) -> f64 {
        let mut value = if value.is_nan() { self.default } else { value };
        if self.stepped {
            value = value.round();
        }
        self.value = value.clamp(self.min, self.max);
        self.value
    }

    /// Menu label, or the value with its unit
    pub fn format(&self) -> String {
        if let Some(label) = self.labels.get(self.value as usize) {
            return label.clone();
        }
        if self.unit.is_empty() {
            format!("{:.prec$}", self.value, prec = self.precision as usize)
        } else {
            format!("{:.prec$} {}", self.value, self.unit, prec = self.precision as usize)
        }
    }
}

/// Which of the coupled pair was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionParam {
    BeatDivision,
    NotesPerBeat,
}

/// Keep `notes_per_beat <= beat_division`, adjusting the parameter that
/// was not written.
///
/// Lowering the division drags notes per beat down with it; raising notes
/// per beat pushes the division up.
pub fn constrain_division(
    changed: DivisionParam,
    beat_division: usize,
    notes_per_beat: usize,
) -> (usize, usize) {
    let beat_division = beat_division.max(1);
    let notes_per_beat = notes_per_beat.max(1);
    if notes_per_beat <= beat_division {
        return (beat_division, notes_per_beat);
    }
    match changed {
        DivisionParam::BeatDivision => (beat_division, beat_division),
        DivisionParam::NotesPerBeat => (notes_per_beat, notes_per_beat),
    }
}

/// Named parameters in registration order
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    params: HashMap<String, Parameter>,
    order: Vec<String>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full arpeggiator surface at defaults
    pub fn eggiator() -> Self {
        let mut registry = Self::new();
        for param in presets::all() {
            registry.register(param);
        }
        registry
    }

    /// Add `param`, replacing any parameter with the same name in place
    pub fn register(&mut self, param: Parameter) {
        let name = param.name.clone();
        self.params.insert(name.clone(), param);
        if !self.order.contains(&name) {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Set parameter value by name.
    ///
    /// Writing beat division or notes per beat also corrects the other one
    /// so the pair stays valid. Returns the value stored for `name`.
    pub fn set(&mut self, name: &str, value: f64) -> Result<f64, SchedulerError> {
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| SchedulerError::UnknownParameter(name.to_string()))?;
        let stored = param.set(value);

        let changed = match name {
            names::BEAT_DIVISION => DivisionParam::BeatDivision,
            names::NOTES_PER_BEAT => DivisionParam::NotesPerBeat,
            _ => return Ok(stored),
        };
        self.constrain(changed);
        self.value(name)
            .ok_or_else(|| SchedulerError::UnknownParameter(name.to_string()))
    }

    fn constrain(&mut self, changed: DivisionParam) {
        let (Some(division), Some(notes)) = (
            self.value(names::BEAT_DIVISION),
            self.value(names::NOTES_PER_BEAT),
        ) else {
            return;
        };
        let (division, notes) = constrain_division(changed, division as usize, notes as usize);
        if let Some(p) = self.params.get_mut(names::BEAT_DIVISION) {
            p.set(division as f64);
        }
        if let Some(p) = self.params.get_mut(names::NOTES_PER_BEAT) {
            p.set(notes as f64);
        }
    }

    /// Current value of `name`, if registered
    pub fn value(&self, name: &str) -> Option<f64> {
        self.params.get(name).map(|p| p.get())
    }

    /// Value of a parameter that is known to be registered, or `fallback`
    pub fn value_or(&self, name: &str, fallback: f64) -> f64 {
        self.value(name).unwrap_or(fallback)
    }

    /// Iterate over all parameters in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.order.iter().filter_map(|name| self.params.get(name))
    }

    /// Parameters in `group`, in registration order
    pub fn iter_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Parameter> {
        self.iter().filter(move |p| p.group == group)
    }

    /// Sorted, distinct group names
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self.params.values().map(|p| p.group.clone()).collect();
        groups.sort();
        groups.dedup();
        groups
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Definitions of the arpeggiator parameters
pub mod presets {
    use super::{names, Parameter};
    use crate::sequencer::NoteOrder;

    /// Subdivisions per beat
    pub fn beat_division() -> Parameter {
        Parameter::new(names::BEAT_DIVISION, 1.0, 64.0, 4.0)
            .group("Rhythm")
            .stepped()
    }

    /// Notes placed in each beat
    pub fn notes_per_beat() -> Parameter {
        Parameter::new(names::NOTES_PER_BEAT, 1.0, 64.0, 4.0)
            .group("Rhythm")
            .stepped()
    }

    /// Up / Down / Random
    pub fn note_order() -> Parameter {
        Parameter::new(names::NOTE_ORDER, 0.0, 2.0, 0.0)
            .group("Notes")
            .menu(&NoteOrder::LABELS)
    }

    /// Notes sounded per slot
    pub fn simultaneous_notes() -> Parameter {
        Parameter::new(names::SIMULTANEOUS_NOTES, 1.0, 16.0, 1.0)
            .group("Notes")
            .stepped()
    }

    /// Length of each note
    pub fn note_length() -> Parameter {
        Parameter::new(names::NOTE_LENGTH, 1.0, 200.0, 100.0)
            .unit("%")
            .group("Length")
    }

    /// Length of each note when lengths are given in milliseconds
    pub fn note_length_ms() -> Parameter {
        Parameter::new(names::NOTE_LENGTH, 1.0, 2000.0, 250.0)
            .unit("ms")
            .group("Length")
    }

    /// Length jitter
    pub fn random_length() -> Parameter {
        Parameter::new(names::RANDOM_LENGTH, 0.0, 200.0, 0.0)
            .unit("%")
            .group("Length")
    }

    /// Delay jitter
    pub fn random_delay() -> Parameter {
        Parameter::new(names::RANDOM_DELAY, 0.0, 200.0, 0.0)
            .unit("%")
            .group("Timing")
    }

    /// Octave spread
    pub fn random_octave() -> Parameter {
        Parameter::new(names::RANDOM_OCTAVE, 1.0, 4.0, 1.0)
            .group("Notes")
            .stepped()
    }

    /// Octave transpose
    pub fn octave() -> Parameter {
        Parameter::new(names::OCTAVE, -4.0, 4.0, 0.0)
            .group("Modifiers")
            .stepped()
    }

    /// Tempo ramp
    pub fn accelerando() -> Parameter {
        Parameter::new(names::ACCELERANDO, 0.0, 100.0, 0.0)
            .unit("%")
            .group("Modifiers")
    }

    /// Velocity ramp
    pub fn diminuendo() -> Parameter {
        Parameter::new(names::DIMINUENDO, 0.0, 100.0, 0.0)
            .unit("%")
            .group("Modifiers")
    }

    /// Every parameter, in display order
    pub fn all() -> Vec<Parameter> {
        vec![
            beat_division(),
            notes_per_beat(),
            note_order(),
            simultaneous_notes(),
            note_length(),
            random_length(),
            random_delay(),
            random_octave(),
            octave(),
            accelerando(),
            diminuendo(),
        ]
    }
}
