// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Actuation policy: whether a computed fan speed is worth commanding.

/// Hysteresis band in percentage points. A difference of exactly this
/// much is still inside the band.
pub const HYSTERESIS_BAND: u8 = 5;

/// Outcome of comparing the observed fan speed to the curve's speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationDecision {
    /// Observed speed is within the hysteresis band.
    NoAction,
    /// Command the fan to this percentage.
    SetFanSpeed(u8),
}

/// Decide whether to command a new fan speed.
pub fn decide(current_fan_speed: u8, computed_fan_speed: u8) -> ActuationDecision {
    if current_fan_speed.abs_diff(computed_fan_speed) > HYSTERESIS_BAND {
        ActuationDecision::SetFanSpeed(computed_fan_speed)
    } else {
        ActuationDecision::NoAction
    }
}
