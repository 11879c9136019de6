// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Conversion of rhythm patterns into time offsets from the start of a beat.

use serde::{Deserialize, Serialize};

use super::RhythmPattern;

/// Unit offsets are stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    /// Fractions of a beat
    #[default]
    Beats,
    /// Milliseconds at the tempo of generation
    Milliseconds,
}

impl OffsetUnit {
    /// Length of one subdivision in this unit
    pub fn unit_duration(self, subdivisions: usize, tempo: f64) -> f64 {
        let subdivisions = subdivisions.max(1) as f64;
        match self {
            OffsetUnit::Beats => 1.0 / subdivisions,
            OffsetUnit::Milliseconds => 60_000.0 / tempo.max(f64::EPSILON) / subdivisions,
        }
    }

    /// Convert a value in this unit to beats
    pub fn to_beats(self, value: f64, tempo: f64) -> f64 {
        match self {
            OffsetUnit::Beats => value,
            OffsetUnit::Milliseconds => value * tempo / 60_000.0,
        }
    }
}

/// Offset `i * unit_duration` for every active slot `i`, ascending.
pub fn compute_offsets(pattern: &RhythmPattern, unit_duration: f64) -> Vec<f64> {
    pattern
        .active_indices()
        .map(|i| i as f64 * unit_duration)
        .collect()
}

/// Ordered offsets derived from one rhythm pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OffsetSequence {
    values: Vec<f64>,
    unit: OffsetUnit,
}

impl OffsetSequence {
    /// Derive offsets for a pattern at the given tempo
    pub fn from_pattern(pattern: &RhythmPattern, unit: OffsetUnit, tempo: f64) -> Self {
        let duration = unit.unit_duration(pattern.len(), tempo);
        Self {
            values: compute_offsets(pattern, duration),
            unit,
        }
    }

    /// Offsets in their native unit
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Unit of the stored offsets
    pub fn unit(&self) -> OffsetUnit {
        self.unit
    }

    /// Number of offsets
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the offsets, in beats, into `out`.
    ///
    /// A zero offset becomes `downbeat_epsilon` so that a note exactly on
    /// the downbeat is not lost to a boundary comparison.
    pub fn fill_beats(&self, tempo: f64, downbeat_epsilon: f64, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.values.iter().map(|&v| {
            let beats = self.unit.to_beats(v, tempo);
            if beats == 0.0 {
                downbeat_epsilon.max(0.0)
            } else {
                beats
            }
        }));
    }
}
