//! Minimal TOML reader for the board configuration
//!
//! Handles only the subset `pantilt.toml` uses. It does NOT support the
//! full TOML spec.
//!
//! Supported:
//! - `key = value` pairs with integer values
//! - `[section]` and `[section.subsection]` headers
//! - Comments (`# ...`), including trailing ones
//!
//! Unknown sections and keys are ignored so that newer files still load.

use super::hardware::{ConfigError, HardwareConfig, ServoCalibration};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed section header
    InvalidSection,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Value is not a valid number for its key
    InvalidValue,
    /// The parsed values failed validation
    Invalid(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Invalid(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    ServoPan,
    ServoTilt,
    Pwm,
    Motion,
    Serial,
    Unknown,
}

/// Parse `pantilt.toml` into a validated [`HardwareConfig`]
///
/// Missing keys keep their defaults.
pub fn parse_hardware_config(input: &str) -> Result<HardwareConfig, ParseError> {
    let mut config = HardwareConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header.strip_suffix(']').ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.validate()?;
    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();
    if header.is_empty() || header.split('.').any(|part| part.trim().is_empty()) {
        return Err(ParseError::InvalidSection);
    }
    Ok(match header {
        "servo.pan" => Section::ServoPan,
        "servo.tilt" => Section::ServoTilt,
        "pwm" => Section::Pwm,
        "motion" => Section::Motion,
        "serial" => Section::Serial,
        _ => Section::Unknown,
    })
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    // TOML allows `_` separators; values here are short enough to copy
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn apply_servo(servo: &mut ServoCalibration, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "min_us" => servo.min_us = parse_int(value)?,
        "max_us" => servo.max_us = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut HardwareConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::ServoPan, _) => apply_servo(&mut config.pan, key, value)?,
        (Section::ServoTilt, _) => apply_servo(&mut config.tilt, key, value)?,
        (Section::Pwm, "frame_us") => config.frame_us = parse_int(value)?,
        (Section::Motion, "tick_ms") => config.tick_ms = parse_int(value)?,
        (Section::Serial, "baud") => config.baud = parse_int(value)?,
        (Section::Serial, "flood_max_lines") => config.flood_max_lines = parse_int(value)?,
        _ => {}
    }
    Ok(())
}
