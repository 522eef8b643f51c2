// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Error types for curve loading and GPU access.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a config file into a [`FanCurve`].
///
/// All of these are fatal at startup.
///
/// [`FanCurve`]: crate::curve::FanCurve
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A non-comment line is not exactly two integers.
    #[error("config line {line} is not in `<temperature> <fan speed>` format: {content:?}")]
    Format { line: usize, content: String },

    /// A fan speed above 100%.
    #[error("config line {line}: fan speed {speed}% is outside 0-100")]
    SpeedOutOfRange { line: usize, speed: u32 },

    /// Nothing left after dropping comments and blank lines.
    #[error("config contains no threshold entries")]
    Empty,

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by a [`GpuDevice`] while reading or commanding the GPU.
///
/// [`GpuDevice`]: crate::device::GpuDevice
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The vendor tool could not be launched at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The sensor query exited unsuccessfully.
    #[error("sensor query failed ({status}): {stderr}")]
    QueryFailed { status: String, stderr: String },

    /// The sensor query ran but a value could not be extracted.
    #[error("could not parse {field} from sensor output")]
    SensorParse { field: &'static str, output: String },

    /// The fan speed command exited unsuccessfully.
    #[error("fan command failed ({status}): {stderr}")]
    ActuatorCommand { status: String, stderr: String },
}
