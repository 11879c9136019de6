// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rhythm generation for one beat.
//!
//! This module provides:
//! - Random rhythm patterns over the subdivisions of a beat
//! - Conversion of patterns into time offsets
//! - [`Phrase`], which keeps a pattern and its offsets together

pub mod offsets;
pub mod rhythm;

pub use offsets::{compute_offsets, OffsetSequence, OffsetUnit};
pub use rhythm::{clamp_active, generate, RhythmPattern};

use rand::Rng;
use tracing::debug;

/// A rhythm pattern and the offsets derived from it.
///
/// The two are only ever produced together so they cannot drift apart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Phrase {
    pattern: RhythmPattern,
    offsets: OffsetSequence,
}

impl Phrase {
    /// Generate a fresh pattern and its offsets.
    ///
    /// `active` is clamped into `1..=subdivisions` first, so this never fails.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        subdivisions: usize,
        active: usize,
        unit: OffsetUnit,
        tempo: f64,
    ) -> Self {
        let subdivisions = subdivisions.max(1);
        let clamped = clamp_active(subdivisions, active);
        if clamped != active {
            debug!(subdivisions, active, clamped, "clamped active count");
        }

        let pattern = match generate(rng, subdivisions, clamped) {
            Ok(pattern) => pattern,
            // Unreachable after clamping; fall back to a full beat
            Err(_) => RhythmPattern::full(subdivisions),
        };
        Self::from_pattern(pattern, unit, tempo)
    }

    /// Build a phrase from a known pattern
    pub fn from_pattern(pattern: RhythmPattern, unit: OffsetUnit, tempo: f64) -> Self {
        let offsets = OffsetSequence::from_pattern(&pattern, unit, tempo);
        Self { pattern, offsets }
    }

    /// The rhythm pattern
    pub fn pattern(&self) -> &RhythmPattern {
        &self.pattern
    }

    /// The offsets derived from the pattern
    pub fn offsets(&self) -> &OffsetSequence {
        &self.offsets
    }

    /// Number of notes in the phrase
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Check if the phrase holds no notes
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
