// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! The GPU seen by the control loop: something that reports its state
//! and accepts fan commands.

use crate::error::DeviceError;

/// One poll's worth of GPU state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Core temperature in degrees Celsius
    pub temperature: i32,
    /// Current fan speed percentage
    pub fan_speed: u8,
}

/// Sensor and fan access for a single GPU.
///
/// Calls are blocking and made from the control loop's thread.
pub trait GpuDevice {
    /// Read the current core temperature and fan speed.
    fn read_state(&mut self) -> Result<Reading, DeviceError>;

    /// Switch to manual fan control and command `target` percent.
    fn set_fan_speed(&mut self, target: u8) -> Result<(), DeviceError>;

    /// Hand fan control back to the driver.
    fn restore_automatic(&mut self) -> Result<(), DeviceError>;
}
