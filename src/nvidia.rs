// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! NVIDIA GPU access through the `nvidia-settings` command line tool.
//!
//! Queries look like:
//!
//! ```text
//!   Attribute 'GPUCoreTemp' (host:0[gpu:0]): 54.
//!   Attribute 'GPUCurrentFanSpeed' (host:0[fan:0]): 41.
//! ```
//!
//! Only the first GPU and fan reported are used.

use crate::device::{GpuDevice, Reading};
use crate::error::DeviceError;
use regex::Regex;
use std::process::{Command, Output};

/// Default name of the vendor tool, looked up on `PATH`.
pub const DEFAULT_PROGRAM: &str = "nvidia-settings";

const CORE_TEMP_ATTR: &str = "GPUCoreTemp";
const FAN_SPEED_ATTR: &str = "GPUCurrentFanSpeed";

/// [`GpuDevice`] backed by `nvidia-settings`.
#[derive(Debug, Clone)]
pub struct NvidiaSettings {
    program: String,
    core_temp: Regex,
    fan_speed: Regex,
}

impl NvidiaSettings {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a different executable, e.g. an absolute path or a wrapper.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            core_temp: attribute_pattern(CORE_TEMP_ATTR),
            fan_speed: attribute_pattern(FAN_SPEED_ATTR),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Extract temperature and fan speed from query output.
    pub fn parse_query_output(&self, output: &str) -> Result<Reading, DeviceError> {
        let temperature = capture_value::<i32>(&self.core_temp, output).ok_or_else(|| {
            DeviceError::SensorParse {
                field: CORE_TEMP_ATTR,
                output: output.to_string(),
            }
        })?;
        let fan_speed = capture_value::<u8>(&self.fan_speed, output).ok_or_else(|| {
            DeviceError::SensorParse {
                field: FAN_SPEED_ATTR,
                output: output.to_string(),
            }
        })?;

        Ok(Reading {
            temperature,
            fan_speed,
        })
    }

    fn run(&self, args: &[String]) -> Result<Output, DeviceError> {
        log::debug!("Running {} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| DeviceError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    fn assign(&self, assignments: &[String]) -> Result<(), DeviceError> {
        let args: Vec<String> = assignments
            .iter()
            .flat_map(|a| ["-a".to_string(), a.clone()])
            .collect();
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(DeviceError::ActuatorCommand {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for NvidiaSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for NvidiaSettings {
    fn read_state(&mut self) -> Result<Reading, DeviceError> {
        let args = ["-q", CORE_TEMP_ATTR, "-q", FAN_SPEED_ATTR].map(String::from);
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(DeviceError::QueryFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        log::debug!("{} output:\n{}", self.program, stdout.trim_end());
        self.parse_query_output(&stdout)
    }

    fn set_fan_speed(&mut self, target: u8) -> Result<(), DeviceError> {
        self.assign(&[
            "GPUFanControlState=1".to_string(),
            format!("GPUTargetFanSpeed={target}"),
        ])
    }

    fn restore_automatic(&mut self) -> Result<(), DeviceError> {
        self.assign(&["GPUFanControlState=0".to_string()])
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn attribute_pattern(attr: &str) -> Regex {
    let pattern = format!(r"'{}' \(.*\): (-?\d+)\.", regex::escape(attr));
    Regex::new(&pattern).expect("attribute pattern is a valid regex")
}

fn capture_value<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_OUTPUT: &str = "\n  Attribute 'GPUCoreTemp' (desktop:0[gpu:0]): 54.\n    \
        'GPUCoreTemp' is an integer attribute.\n    \
        'GPUCoreTemp' is a read-only attribute.\n\n  \
        Attribute 'GPUCurrentFanSpeed' (desktop:0[fan:0]): 41.\n    \
        The valid values for 'GPUCurrentFanSpeed' are in the range 0 - 100 (inclusive).\n";

    #[test]
    fn test_parse_query_output() {
        let nv = NvidiaSettings::new();
        let reading = nv.parse_query_output(QUERY_OUTPUT).unwrap();
        assert_eq!(
            reading,
            Reading {
                temperature: 54,
                fan_speed: 41
            }
        );
    }

    #[test]
    fn test_missing_temperature() {
        let nv = NvidiaSettings::new();
        let out = "  Attribute 'GPUCurrentFanSpeed' (desktop:0[fan:0]): 41.\n";
        match nv.parse_query_output(out) {
            Err(DeviceError::SensorParse { field, .. }) => assert_eq!(field, "GPUCoreTemp"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fan_speed() {
        let nv = NvidiaSettings::new();
        let out = "  Attribute 'GPUCoreTemp' (desktop:0[gpu:0]): 54.\n";
        match nv.parse_query_output(out) {
            Err(DeviceError::SensorParse { field, .. }) => {
                assert_eq!(field, "GPUCurrentFanSpeed")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_tool_error_output_is_sensor_parse_error() {
        let nv = NvidiaSettings::new();
        let out = "ERROR: The control display is undefined; please run `nvidia-settings --help`\n";
        assert!(matches!(
            nv.parse_query_output(out),
            Err(DeviceError::SensorParse { .. })
        ));
    }

    #[test]
    fn test_fan_speed_out_of_u8_range_rejected() {
        let nv = NvidiaSettings::new();
        let out = "Attribute 'GPUCoreTemp' (h:0[gpu:0]): 54.\n\
                   Attribute 'GPUCurrentFanSpeed' (h:0[fan:0]): 300.\n";
        assert!(matches!(
            nv.parse_query_output(out),
            Err(DeviceError::SensorParse {
                field: "GPUCurrentFanSpeed",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut nv = NvidiaSettings::with_program("/nonexistent/nvidia-settings");
        assert!(matches!(
            nv.read_state(),
            Err(DeviceError::Spawn { .. })
        ));
        assert!(matches!(
            nv.set_fan_speed(50),
            Err(DeviceError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_assignment_is_actuator_error() {
        let mut nv = NvidiaSettings::with_program("false");
        assert!(matches!(
            nv.set_fan_speed(50),
            Err(DeviceError::ActuatorCommand { .. })
        ));
        assert!(matches!(
            nv.read_state(),
            Err(DeviceError::QueryFailed { .. })
        ));
    }
}
