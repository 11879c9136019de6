// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-callback timing window supplied by the host.
//!
//! A window covers the beat range `[start_beat, end_beat)` of one audio
//! buffer. When the host is cycling and the buffer runs past the loop end,
//! `end_beat` is reported unwrapped (greater than `loop_end`) and the part
//! beyond the loop end actually plays from `loop_start`.

use crate::error::SchedulerError;

/// Timing information for one processing buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindow {
    /// First beat of the buffer (inclusive)
    pub start_beat: f64,
    /// End beat of the buffer (exclusive, unwrapped)
    pub end_beat: f64,
    /// Tempo in BPM
    pub tempo: f64,
    /// Whether cycle mode is on
    pub looping: bool,
    /// Left edge of the cycle
    pub loop_start: f64,
    /// Right edge of the cycle
    pub loop_end: f64,
    /// Whether the transport is running
    pub playing: bool,
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            start_beat: 0.0,
            end_beat: 0.0,
            tempo: 120.0,
            looping: false,
            loop_start: 0.0,
            loop_end: 0.0,
            playing: false,
        }
    }
}

/// A contiguous piece of a window in host beat coordinates.
///
/// `shift` maps a host beat in this segment back onto the unwrapped
/// window timeline: `timeline = host + shift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Segment start (inclusive)
    pub start: f64,
    /// Segment end (exclusive)
    pub end: f64,
    /// Offset from host beats to window timeline beats
    pub shift: f64,
    /// True for the part of the window that plays after the loop point
    pub wrapped: bool,
}

impl Segment {
    /// Check whether a host beat falls inside the segment
    pub fn contains(&self, beat: f64) -> bool {
        beat >= self.start && beat < self.end
    }
}

impl TimingWindow {
    /// Create a playing, non-looping window
    pub fn new(start_beat: f64, end_beat: f64, tempo: f64) -> Self {
        Self {
            start_beat,
            end_beat,
            tempo,
            playing: true,
            ..Default::default()
        }
    }

    /// Enable cycle mode over `[loop_start, loop_end)`
    pub fn with_loop(mut self, loop_start: f64, loop_end: f64) -> Self {
        self.looping = true;
        self.loop_start = loop_start;
        self.loop_end = loop_end;
        self
    }

    /// Mark the transport as stopped
    pub fn stopped(mut self) -> Self {
        self.playing = false;
        self
    }

    /// Reject windows the scheduler cannot work with
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let finite = self.start_beat.is_finite() && self.end_beat.is_finite();
        if !finite || self.end_beat <= self.start_beat {
            return Err(SchedulerError::DegenerateWindow {
                start: self.start_beat,
                end: self.end_beat,
            });
        }
        Ok(())
    }

    /// Length of the cycle in beats (0 when not looping)
    pub fn loop_length(&self) -> f64 {
        if self.looping {
            (self.loop_end - self.loop_start).max(0.0)
        } else {
            0.0
        }
    }

    /// Whether this buffer reaches the loop end, so the next one plays
    /// from the loop start
    pub fn wraps(&self) -> bool {
        self.loop_length() > 0.0
            && self.start_beat < self.loop_end
            && self.end_beat >= self.loop_end
    }

    /// Split the window at the loop point.
    ///
    /// Returns the part before the loop end and, if the buffer wraps, the
    /// part that plays from the loop start. The wrapped part never extends
    /// past one full cycle and is empty when the buffer ends exactly on
    /// the loop end.
    pub fn segments(&self) -> (Segment, Option<Segment>) {
        if !self.wraps() {
            let whole = Segment {
                start: self.start_beat,
                end: self.end_beat,
                shift: 0.0,
                wrapped: false,
            };
            return (whole, None);
        }

        let loop_len = self.loop_length();
        let before = Segment {
            start: self.start_beat,
            end: self.loop_end,
            shift: 0.0,
            wrapped: false,
        };
        let overflow = (self.end_beat - self.loop_end).min(loop_len);
        let after = Segment {
            start: self.loop_start,
            end: self.loop_start + overflow,
            shift: loop_len,
            wrapped: true,
        };
        (before, Some(after))
    }

    /// Milliseconds per beat at the window tempo
    pub fn ms_per_beat(&self) -> f64 {
        60_000.0 / self.tempo.max(f64::EPSILON)
    }

    /// Convert a beat duration to milliseconds at the window tempo
    pub fn beats_to_ms(&self, beats: f64) -> f64 {
        beats * self.ms_per_beat()
    }
}
