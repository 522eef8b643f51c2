// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Step fan curves.
//!
//! A curve maps GPU temperature (degrees Celsius) to a fan speed
//! percentage (0-100). Each threshold holds its speed until the next
//! threshold is reached; there is no interpolation between steps.
//! Below the lowest threshold the fan may stop, so the speed is 0.

use crate::error::ConfigError;
use std::fmt;

/// A single step on a fan curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdEntry {
    /// Temperature in degrees Celsius at which this step starts
    pub temperature: i32,
    /// Fan speed percentage (0-100)
    pub fan_speed: u8,
}

impl ThresholdEntry {
    pub fn new(temperature: i32, fan_speed: u8) -> Self {
        Self {
            temperature,
            fan_speed,
        }
    }
}

impl From<(i32, u8)> for ThresholdEntry {
    fn from((temperature, fan_speed): (i32, u8)) -> Self {
        Self::new(temperature, fan_speed)
    }
}

/// A validated, non-empty step curve sorted by ascending temperature.
///
/// Temperatures are unique. Once built the curve is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanCurve {
    entries: Vec<ThresholdEntry>,
}

impl FanCurve {
    /// Build a curve from entries in any order.
    ///
    /// Entries are stably sorted by temperature. When a temperature appears
    /// more than once the entry inserted last wins, the same way a later
    /// line in a config file overrides an earlier one.
    pub fn from_entries<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ThresholdEntry>,
    {
        let mut entries: Vec<ThresholdEntry> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(ConfigError::Empty);
        }

        entries.sort_by_key(|e| e.temperature);

        let mut sorted: Vec<ThresholdEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match sorted.last_mut() {
                Some(last) if last.temperature == entry.temperature => *last = entry,
                _ => sorted.push(entry),
            }
        }

        Ok(Self { entries: sorted })
    }

    /// Fan speed mandated for `temperature`.
    ///
    /// Returns the speed of the greatest threshold at or below
    /// `temperature`, or 0 when every threshold is above it.
    pub fn speed_at(&self, temperature: i32) -> u8 {
        let idx = self
            .entries
            .partition_point(|e| e.temperature <= temperature);
        match idx {
            0 => 0,
            n => self.entries[n - 1].fan_speed,
        }
    }

    /// Thresholds in ascending temperature order.
    pub fn entries(&self) -> &[ThresholdEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true for a curve built by `from_entries`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when fan speed never drops as the temperature rises.
    pub fn is_monotonic(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].fan_speed <= w[1].fan_speed)
    }
}

impl fmt::Display for FanCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}C->{}%", e.temperature, e.fan_speed))
            .collect();
        write!(f, "[{}]", steps.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve_of(pairs: &[(i32, u8)]) -> FanCurve {
        FanCurve::from_entries(pairs.iter().copied().map(ThresholdEntry::from)).unwrap()
    }

    fn sample_curve() -> FanCurve {
        curve_of(&[(60, 50), (40, 30), (80, 80)])
    }

    #[test]
    fn test_entries_are_sorted() {
        let curve = sample_curve();
        let temps: Vec<i32> = curve.entries().iter().map(|e| e.temperature).collect();
        assert_eq!(temps, vec![40, 60, 80]);
    }

    #[test]
    fn test_empty_curve_rejected() {
        let result = FanCurve::from_entries(Vec::<ThresholdEntry>::new());
        assert!(matches!(result, Err(ConfigError::Empty)));
    }

    #[test]
    fn test_between_thresholds_uses_lower_step() {
        assert_eq!(sample_curve().speed_at(70), 50);
    }

    #[test]
    fn test_below_lowest_threshold_is_off() {
        let curve = sample_curve();
        assert_eq!(curve.speed_at(35), 0);
        assert_eq!(curve.speed_at(39), 0);
        assert_eq!(curve.speed_at(-20), 0);
        assert_eq!(curve.speed_at(i32::MIN), 0);
    }

    #[test]
    fn test_exact_threshold_applies_its_step() {
        let curve = sample_curve();
        assert_eq!(curve.speed_at(40), 30);
        assert_eq!(curve.speed_at(60), 50);
        assert_eq!(curve.speed_at(59), 30);
    }

    #[test]
    fn test_at_or_above_highest_threshold() {
        let curve = sample_curve();
        assert_eq!(curve.speed_at(80), 80);
        assert_eq!(curve.speed_at(95), 80);
        assert_eq!(curve.speed_at(i32::MAX), 80);
    }

    #[test]
    fn test_single_entry_curve() {
        let curve = FanCurve::from_entries([ThresholdEntry::new(50, 40)]).unwrap();
        assert_eq!(curve.speed_at(49), 0);
        assert_eq!(curve.speed_at(50), 40);
        assert_eq!(curve.speed_at(120), 40);
    }

    #[test]
    fn test_negative_thresholds() {
        let curve = curve_of(&[(-10, 20), (0, 40)]);
        assert_eq!(curve.speed_at(-11), 0);
        assert_eq!(curve.speed_at(-5), 20);
        assert_eq!(curve.speed_at(3), 40);
    }

    #[test]
    fn test_output_is_always_a_configured_speed_or_zero() {
        let curve = sample_curve();
        let allowed = [0u8, 30, 50, 80];
        for t in -50..150 {
            assert!(allowed.contains(&curve.speed_at(t)), "temp {t}");
        }
    }

    #[test]
    fn test_speed_is_monotonic_for_rising_curve() {
        let curve = curve_of(&[(30, 10), (45, 25), (55, 25), (70, 60), (85, 100)]);
        assert!(curve.is_monotonic());

        let mut previous = curve.speed_at(-100);
        for t in -99..200 {
            let speed = curve.speed_at(t);
            assert!(speed >= previous, "speed dropped at {t}C");
            previous = speed;
        }
    }

    #[test]
    fn test_duplicate_temperature_last_inserted_wins() {
        let curve = curve_of(&[(50, 20), (70, 60), (50, 35)]);
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.entries()[0], ThresholdEntry::new(50, 35));
        assert_eq!(curve.speed_at(55), 35);
    }

    #[test]
    fn test_falling_curve_is_not_monotonic() {
        let curve = curve_of(&[(40, 80), (60, 30)]);
        assert!(!curve.is_monotonic());
    }

    #[test]
    fn test_display() {
        assert_eq!(sample_curve().to_string(), "[40C->30%, 60C->50%, 80C->80%]");
    }
}
