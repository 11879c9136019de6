// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the eggiator engine.
//!
//! A config file holds the initial parameter values and the scheduling
//! policies the host cannot change at run time. Files ending in `.toml`
//! are read as TOML; everything else is read as YAML.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::control::{constrain_division, names, DivisionParam, ParameterRegistry};
use crate::generators::OffsetUnit;
use crate::sequencer::{NoteLengthUnit, NoteOrder, OffsetRefresh, RearmMode, SchedulerSettings};

/// Root engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    /// Initial parameter values
    #[serde(default)]
    pub parameters: ParameterConfig,
    /// Scheduling policies
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl EngineConfig {
    /// Load a configuration, choosing the format by file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = if is_toml(path) {
            Self::from_toml(&contents)?
        } else {
            Self::from_yaml(&contents)?
        };
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a configuration from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration to TOML")
    }

    /// Save configuration, choosing the format by file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = if is_toml(path) {
            self.to_toml()?
        } else {
            self.to_yaml()?
        };
        fs::write(path, text).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Reject values no clamp can make sense of
    pub fn validate(&self) -> Result<()> {
        let p = &self.parameters;
        if p.beat_division == 0 {
            bail!("beat_division must be at least 1");
        }
        if p.notes_per_beat == 0 {
            bail!("notes_per_beat must be at least 1");
        }
        let amounts = [
            ("note_length", p.note_length),
            ("random_length", p.random_length),
            ("random_delay", p.random_delay),
            ("downbeat_epsilon", self.policy.downbeat_epsilon),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number, got {}", name, value);
            }
        }
        if self.policy.downbeat_epsilon >= 1.0 {
            bail!("downbeat_epsilon must be below one beat");
        }
        Ok(())
    }

    /// Scheduler settings described by this configuration
    pub fn settings(&self) -> SchedulerSettings {
        let p = &self.parameters;
        let (beat_division, notes_per_beat) =
            constrain_division(DivisionParam::BeatDivision, p.beat_division, p.notes_per_beat);
        SchedulerSettings {
            beat_division,
            notes_per_beat,
            note_order: p.note_order,
            simultaneous_notes: p.simultaneous_notes,
            note_length: p.note_length,
            note_length_unit: self.policy.note_length_unit,
            random_length: p.random_length,
            random_delay: p.random_delay,
            random_octave: p.random_octave,
            offset_unit: self.policy.offset_unit,
            downbeat_epsilon: self.policy.downbeat_epsilon,
            rearm: self.policy.rearm,
            offset_refresh: self.policy.offset_refresh,
            beats_per_phrase: self.policy.beats_per_phrase,
        }
        .normalized()
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Initial parameter values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterConfig {
    /// Subdivisions per beat (1-64)
    #[serde(default = "default_division")]
    pub beat_division: usize,
    /// Notes per beat (1-64, at most `beat_division`)
    #[serde(default = "default_division")]
    pub notes_per_beat: usize,
    /// Held note order
    #[serde(default)]
    pub note_order: NoteOrder,
    /// Notes sounded per slot (1-16)
    #[serde(default = "default_one")]
    pub simultaneous_notes: usize,
    /// Note length
    #[serde(default = "default_note_length")]
    pub note_length: f64,
    /// Length jitter in percent
    #[serde(default)]
    pub random_length: f64,
    /// Delay jitter in percent
    #[serde(default)]
    pub random_delay: f64,
    /// Octave spread (1-4)
    #[serde(default = "default_random_octave")]
    pub random_octave: u8,
    /// Octave transpose, stored only
    #[serde(default)]
    pub octave: i8,
    /// Stored only
    #[serde(default)]
    pub accelerando: f64,
    /// Stored only
    #[serde(default)]
    pub diminuendo: f64,
}

fn default_division() -> usize {
    4
}
fn default_one() -> usize {
    1
}
fn default_note_length() -> f64 {
    100.0
}
fn default_random_octave() -> u8 {
    1
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            beat_division: default_division(),
            notes_per_beat: default_division(),
            note_order: NoteOrder::default(),
            simultaneous_notes: default_one(),
            note_length: default_note_length(),
            random_length: 0.0,
            random_delay: 0.0,
            random_octave: default_random_octave(),
            octave: 0,
            accelerando: 0.0,
            diminuendo: 0.0,
        }
    }
}

impl ParameterConfig {
    /// Write these values into a registry, clamping as the host would
    pub fn apply(&self, registry: &mut ParameterRegistry) {
        // A notes value above the division is clamped, not allowed to
        // raise the division
        let (division, notes) = constrain_division(
            DivisionParam::BeatDivision,
            self.beat_division,
            self.notes_per_beat,
        );
        let values = [
            (names::BEAT_DIVISION, division as f64),
            (names::NOTES_PER_BEAT, notes as f64),
            (names::NOTE_ORDER, self.note_order.to_value() as f64),
            (names::SIMULTANEOUS_NOTES, self.simultaneous_notes as f64),
            (names::NOTE_LENGTH, self.note_length),
            (names::RANDOM_LENGTH, self.random_length),
            (names::RANDOM_DELAY, self.random_delay),
            (names::RANDOM_OCTAVE, self.random_octave as f64),
            (names::OCTAVE, self.octave as f64),
            (names::ACCELERANDO, self.accelerando),
            (names::DIMINUENDO, self.diminuendo),
        ];
        for (name, value) in values {
            if registry.get(name).is_some() {
                let _ = registry.set(name, value);
            }
        }
    }
}

/// Scheduling policies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    /// Unit phrase offsets are computed in
    #[serde(default)]
    pub offset_unit: OffsetUnit,
    /// Unit of the note length parameter
    #[serde(default)]
    pub note_length_unit: NoteLengthUnit,
    /// Replacement for a zero offset, in beats
    #[serde(default)]
    pub downbeat_epsilon: f64,
    /// When finished phrases are replaced
    #[serde(default)]
    pub rearm: RearmMode,
    /// When offsets follow tempo changes
    #[serde(default)]
    pub offset_refresh: OffsetRefresh,
    /// Beats one pattern is repeated for
    #[serde(default = "default_beats_per_phrase")]
    pub beats_per_phrase: u32,
    /// Fixed random seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_beats_per_phrase() -> u32 {
    1
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            offset_unit: OffsetUnit::default(),
            note_length_unit: NoteLengthUnit::default(),
            downbeat_epsilon: 0.0,
            rearm: RearmMode::default(),
            offset_refresh: OffsetRefresh::default(),
            beats_per_phrase: default_beats_per_phrase(),
            seed: None,
        }
    }
}
