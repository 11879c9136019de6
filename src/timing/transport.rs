// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Simulated host transport.
//!
//! Stands in for the DAW: advances a beat position by a fixed buffer
//! length per callback and reports each buffer as a [`TimingWindow`],
//! wrapping at the loop end when cycle mode is on.

use super::TimingWindow;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
    Paused,
}

/// Fixed-buffer transport that produces one window per callback
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    /// Current tempo in BPM
    bpm: f64,
    /// Current transport state
    state: TransportState,
    /// Beat position of the next buffer
    position: f64,
    /// Buffer length in seconds
    buffer_secs: f64,
    /// Cycle range, if enabled
    cycle: Option<(f64, f64)>,
}

impl SimulatedTransport {
    /// Create a stopped transport with the given tempo and buffer length
    pub fn new(bpm: f64, sample_rate: u32, buffer_frames: u32) -> Self {
        Self {
            bpm: bpm.clamp(20.0, 300.0),
            state: TransportState::Stopped,
            position: 0.0,
            buffer_secs: buffer_frames as f64 / sample_rate.max(1) as f64,
            cycle: None,
        }
    }

    /// Get the current tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo immediately
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(20.0, 300.0);
    }

    /// Nudge tempo by a delta
    pub fn nudge_bpm(&mut self, delta: f64) {
        self.set_bpm(self.bpm + delta);
    }

    /// Enable cycle mode over `[start, end)`; ignored if the range is empty
    pub fn set_cycle(&mut self, start: f64, end: f64) {
        self.cycle = (end > start).then_some((start, end));
    }

    /// Disable cycle mode
    pub fn clear_cycle(&mut self) {
        self.cycle = None;
    }

    /// Get the current transport state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Beat position of the next buffer
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move the playhead
    pub fn locate(&mut self, beat: f64) {
        self.position = beat.max(0.0);
    }

    /// Buffer length in beats at the current tempo
    pub fn buffer_beats(&self) -> f64 {
        self.buffer_secs * self.bpm / 60.0
    }

    /// Start from the top (or the cycle start)
    pub fn start(&mut self) {
        self.state = TransportState::Running;
        self.position = self.cycle.map(|(start, _)| start).unwrap_or(0.0);
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position = 0.0;
    }

    /// Pause at the current position
    pub fn pause(&mut self) {
        self.state = TransportState::Paused;
    }

    /// Continue from paused state
    pub fn continue_playback(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Running;
        }
    }

    /// Produce the window for the next buffer and advance the playhead.
    ///
    /// While not running, the returned window is marked as stopped and the
    /// position does not move.
    pub fn next_window(&mut self) -> TimingWindow {
        let length = self.buffer_beats();
        let mut window = TimingWindow::new(self.position, self.position + length, self.bpm);
        if let Some((start, end)) = self.cycle {
            window = window.with_loop(start, end);
        }

        if self.state != TransportState::Running {
            return window.stopped();
        }

        self.position = window.end_beat;
        if let Some((start, end)) = self.cycle {
            if window.start_beat < end && self.position >= end {
                self.position = start + (self.position - end);
            }
        }

        window
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(120.0, 44_100, 512)
    }
}
