// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Closed-loop GPU fan control.
//!
//! A step curve read from a plain text file maps the GPU core temperature
//! to a fan speed percentage. A single-threaded loop polls the GPU, looks
//! up the mandated speed and commands the fan only when the observed speed
//! is outside the hysteresis band.

pub mod config;
pub mod control;
pub mod curve;
pub mod device;
pub mod error;
pub mod nvidia;
pub mod policy;
