// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rhythm pattern generation.
//!
//! A rhythm pattern marks which subdivisions of a beat carry a note.
//! Patterns are drawn uniformly: every set of `active` slots out of
//! `subdivisions` is equally likely.

use std::fmt;

use rand::seq::index;
use rand::Rng;

use crate::error::SchedulerError;

/// Binary mask over the subdivisions of one beat
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RhythmPattern {
    slots: Vec<bool>,
}

impl RhythmPattern {
    /// Build a pattern from explicit slots
    pub fn from_slots(slots: Vec<bool>) -> Self {
        Self { slots }
    }

    /// Pattern with every slot active
    pub fn full(subdivisions: usize) -> Self {
        Self {
            slots: vec![true; subdivisions],
        }
    }

    /// Number of subdivisions
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the pattern has no subdivisions
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots carrying a note
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|&&s| s).count()
    }

    /// Indices of active slots, ascending
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", u8::from(slot))?;
        }
        write!(f, "]")
    }
}

/// Clamp an active count into `1..=subdivisions`
pub fn clamp_active(subdivisions: usize, active: usize) -> usize {
    active.clamp(1, subdivisions.max(1))
}

/// Pick `active` of `subdivisions` slots uniformly without replacement.
///
/// Callers clamp first; out-of-range counts are rejected rather than
/// silently adjusted here.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    subdivisions: usize,
    active: usize,
) -> Result<RhythmPattern, SchedulerError> {
    if active == 0 || active > subdivisions {
        return Err(SchedulerError::InvalidParameter { subdivisions, active });
    }

    let mut slots = vec![false; subdivisions];
    for i in index::sample(rng, subdivisions, active) {
        slots[i] = true;
    }
    Ok(RhythmPattern { slots })
}
