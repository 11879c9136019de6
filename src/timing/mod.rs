// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the per-buffer timing window the host supplies
//! and a simulated transport that produces such windows.

pub mod transport;
pub mod window;

pub use transport::{SimulatedTransport, TransportState};
pub use window::{Segment, TimingWindow};
