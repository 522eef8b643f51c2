// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Configuration file handling.
//!
//! The curve file is plain text, one threshold per line:
//!
//! ```text
//! # temperature fan_speed
//! 40 30
//! 60 50
//! 80 80
//! ```
//!
//! Lines are trimmed; blank lines and lines starting with `#` are skipped.
//! Default path: `/etc/fan_control.conf`

use crate::curve::{FanCurve, ThresholdEntry};
use crate::error::ConfigError;
use log::LevelFilter;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fan_control.conf";

/// Default time between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Highest fan speed percentage accepted in a config file.
pub const MAX_FAN_SPEED: u32 = 100;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse config text into threshold entries, in file order.
///
/// Every non-blank, non-comment line yields exactly one entry.
pub fn parse_entries(text: &str) -> Result<Vec<ThresholdEntry>, ConfigError> {
    let mut entries = Vec::new();
    let mut seen: HashMap<i32, usize> = HashMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = parse_line(line, line_no)?;
        if let Some(prev) = seen.insert(entry.temperature, line_no) {
            log::warn!(
                "Temperature {}C appears on lines {prev} and {line_no}, line {line_no} wins",
                entry.temperature
            );
        }
        entries.push(entry);
    }

    Ok(entries)
}

/// Parse config text into a sorted fan curve.
pub fn parse_curve(text: &str) -> Result<FanCurve, ConfigError> {
    let entries = parse_entries(text)?;
    log::debug!("Parsed config entries: {entries:?}");

    let curve = FanCurve::from_entries(entries)?;
    log::debug!("Sorted fan curve: {curve}");
    if !curve.is_monotonic() {
        log::warn!("Fan curve lowers fan speed as temperature rises: {curve}");
    }
    Ok(curve)
}

fn parse_line(line: &str, line_no: usize) -> Result<ThresholdEntry, ConfigError> {
    let format_err = || ConfigError::Format {
        line: line_no,
        content: line.to_string(),
    };

    let mut tokens = line.split_whitespace();
    let (Some(temp), Some(speed), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(format_err());
    };

    let temperature: i32 = temp.parse().map_err(|_| format_err())?;
    let speed: u32 = speed.parse().map_err(|_| format_err())?;
    if speed > MAX_FAN_SPEED {
        return Err(ConfigError::SpeedOutOfRange {
            line: line_no,
            speed,
        });
    }

    Ok(ThresholdEntry::new(temperature, speed as u8))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read and parse a curve file.
pub fn load_curve(path: &Path) -> Result<FanCurve, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let curve = parse_curve(&contents)?;
    log::info!(
        "Loaded {} threshold(s) from {}",
        curve.len(),
        path.display()
    );
    Ok(curve)
}

/// Resolve the config file path from CLI arg or default.
pub fn resolve_config_path(cli_path: Option<&str>) -> PathBuf {
    cli_path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Map the CLI log level argument to a filter.
///
/// Level names are matched case-insensitively (`DEBUG`, `trace`, ...).
/// Anything missing or unrecognised means `info`.
pub fn log_filter_for(arg: Option<&str>) -> LevelFilter {
    arg.and_then(|s| s.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}
