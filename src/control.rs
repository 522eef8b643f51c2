// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! The control loop: read the GPU, look up the curve, command the fan,
//! wait, repeat.
//!
//! Waiting is delegated to a [`Scheduler`] so the loop can be driven
//! without real time passing and stopped from outside.

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::curve::FanCurve;
use crate::device::{GpuDevice, Reading};
use crate::error::DeviceError;
use crate::policy::{self, ActuationDecision};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// What to do when a poll cycle cannot obtain a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorErrorPolicy {
    /// Log a warning and try again after the next interval.
    #[default]
    Retry,
    /// Stop the loop and return the error.
    Abort,
}

/// Control loop settings.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Time to wait between poll cycles.
    pub poll_interval: Duration,
    /// Reaction to sensor failures.
    pub sensor_error_policy: SensorErrorPolicy,
    /// Hand fan control back to the driver when the loop ends, if the
    /// loop ever took manual control.
    pub restore_on_exit: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sensor_error_policy: SensorErrorPolicy::default(),
            restore_on_exit: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Paces the loop between cycles.
pub trait Scheduler {
    /// Wait out one poll interval. Returns `false` when the loop should
    /// stop instead of starting another cycle.
    fn wait(&mut self, interval: Duration) -> impl Future<Output = bool>;
}

/// Sleeps on the Tokio timer and stops when `shutdown` is notified.
///
/// A notification sent while a cycle is running is kept and ends the
/// following wait immediately.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    shutdown: Arc<Notify>,
}

impl TokioScheduler {
    pub fn new(shutdown: Arc<Notify>) -> Self {
        Self { shutdown }
    }
}

impl Scheduler for TokioScheduler {
    async fn wait(&mut self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => true,
            _ = self.shutdown.notified() => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Between polls.
    Idle,
    /// Reading the GPU and acting on it.
    Polling,
}

/// Result of one successful poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub reading: Reading,
    /// Speed mandated by the curve for `reading.temperature`.
    pub computed_fan_speed: u8,
    pub decision: ActuationDecision,
    /// True when a fan command was issued and succeeded.
    pub actuated: bool,
}

/// Drives one GPU's fan from a fixed curve.
pub struct ControlLoop<D> {
    curve: FanCurve,
    device: D,
    config: LoopConfig,
    state: LoopState,
    manual_control: bool,
}

impl<D: GpuDevice> ControlLoop<D> {
    pub fn new(curve: FanCurve, device: D, config: LoopConfig) -> Self {
        Self {
            curve,
            device,
            config,
            state: LoopState::Idle,
            manual_control: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn curve(&self) -> &FanCurve {
        &self.curve
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Run cycles until the scheduler says stop.
    ///
    /// With [`SensorErrorPolicy::Abort`] the first sensor failure ends the
    /// loop and is returned. Fan command failures never end the loop.
    pub async fn run<S: Scheduler>(&mut self, scheduler: &mut S) -> Result<(), DeviceError> {
        log::info!(
            "Starting control loop: curve {}, poll interval {:?}, on sensor error: {:?}",
            self.curve,
            self.config.poll_interval,
            self.config.sensor_error_policy
        );

        let result = loop {
            if let Err(e) = self.run_cycle() {
                match self.config.sensor_error_policy {
                    SensorErrorPolicy::Abort => {
                        log::error!("Reading GPU state failed: {e}");
                        break Err(e);
                    }
                    SensorErrorPolicy::Retry => {
                        log::warn!(
                            "Reading GPU state failed: {e}; retrying in {:?}",
                            self.config.poll_interval
                        );
                    }
                }
            }

            if !scheduler.wait(self.config.poll_interval).await {
                log::info!("Control loop stopping");
                break Ok(());
            }
        };

        self.release_fan();
        result
    }

    /// Run a single read-evaluate-decide-act cycle.
    ///
    /// Only sensor failures are returned; a failed fan command is logged
    /// and left for the next cycle to retry.
    pub fn run_cycle(&mut self) -> Result<CycleReport, DeviceError> {
        self.state = LoopState::Polling;
        let report = self.poll();
        self.state = LoopState::Idle;
        report
    }

    fn poll(&mut self) -> Result<CycleReport, DeviceError> {
        let reading = self.device.read_state()?;
        log::info!(
            "Current GPU temperature is {}°C and fan speed is {}%",
            reading.temperature,
            reading.fan_speed
        );

        let computed_fan_speed = self.curve.speed_at(reading.temperature);
        log::debug!("Computed fan speed: {computed_fan_speed}%");

        let decision = policy::decide(reading.fan_speed, computed_fan_speed);
        let actuated = match decision {
            ActuationDecision::SetFanSpeed(target) => {
                log::info!("Setting fan speed to {target}%");
                self.manual_control = true;
                match self.device.set_fan_speed(target) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("Failed to set fan speed to {target}%: {e}");
                        false
                    }
                }
            }
            ActuationDecision::NoAction => {
                log::info!(
                    "Fan speed is already at the correct value {}% ({computed_fan_speed}%)",
                    reading.fan_speed
                );
                false
            }
        };

        Ok(CycleReport {
            reading,
            computed_fan_speed,
            decision,
            actuated,
        })
    }

    fn release_fan(&mut self) {
        if !(self.config.restore_on_exit && self.manual_control) {
            return;
        }
        match self.device.restore_automatic() {
            Ok(()) => {
                self.manual_control = false;
                log::info!("Restored automatic fan control");
            }
            Err(e) => log::warn!("Failed to restore automatic fan control: {e}"),
        }
    }
}
