// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Host-facing parameter control.
//!
//! This module provides:
//! - The named parameter registry the host reads and writes
//! - The beat division / notes per beat constraint

pub mod params;

pub use params::{constrain_division, names, presets, DivisionParam, Parameter, ParameterRegistry};
