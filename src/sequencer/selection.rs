// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Choosing which held notes sound at a scheduled slot.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::HeldNote;
use crate::error::SchedulerError;

/// Order in which held notes are played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteOrder {
    /// Ascending by pitch
    #[default]
    Up,
    /// Descending by pitch
    Down,
    /// Uniform random choice
    Random,
}

impl NoteOrder {
    /// Menu index to order
    pub fn from_value(v: u8) -> Self {
        match v {
            0 => NoteOrder::Up,
            1 => NoteOrder::Down,
            _ => NoteOrder::Random,
        }
    }

    /// Order to menu index
    pub fn to_value(self) -> u8 {
        match self {
            NoteOrder::Up => 0,
            NoteOrder::Down => 1,
            NoteOrder::Random => 2,
        }
    }

    /// Menu labels, indexed by [`NoteOrder::to_value`]
    pub const LABELS: [&'static str; 3] = ["up", "down", "random"];

    /// Pick `min(count, held.len())` distinct notes for one slot.
    ///
    /// `held` must be sorted ascending by pitch. `step` is the absolute
    /// slot number of the note being scheduled; Up and Down index into the
    /// remaining pool with it, so picks within one slot never repeat.
    pub fn select<R: Rng + ?Sized>(
        self,
        held: &[HeldNote],
        step: i64,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<HeldNote>, SchedulerError> {
        if held.is_empty() {
            return Err(SchedulerError::EmptyHeldNotes);
        }

        let picks = count.max(1).min(held.len());
        let mut pool = held.to_vec();
        let mut chosen = Vec::with_capacity(picks);

        for _ in 0..picks {
            let len = pool.len();
            let wrapped = step.rem_euclid(len as i64) as usize;
            let idx = match self {
                NoteOrder::Up => wrapped,
                NoteOrder::Down => len - 1 - wrapped,
                NoteOrder::Random => rng.gen_range(0..len),
            };
            chosen.push(pool.remove(idx));
        }

        Ok(chosen)
    }
}

/// Absolute slot number of a beat position at the given division.
///
/// Stable across phrase regeneration: the same beat always maps to the
/// same slot.
pub fn slot_step(beat: f64, division: usize) -> i64 {
    (beat * division.max(1) as f64 + 1e-6).floor() as i64
}
