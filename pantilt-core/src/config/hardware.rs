//! Board-level configuration
//!
//! Servo pulse ranges, PWM frame, tick interval and serial settings. The
//! firmware fills this from `pantilt.toml` at boot.

use pantilt_hal::PulseWidth;
use pantilt_protocol::framing::DEFAULT_FLOOD_MAX_LINES;

use crate::motion::{clamp_angle, ANGLE_MAX};

/// Pulse range of one servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoCalibration {
    /// Pulse at -90 degrees
    pub min_us: u16,
    /// Pulse at +90 degrees
    pub max_us: u16,
}

impl ServoCalibration {
    /// Pan servo range
    pub const PAN_DEFAULT: Self = Self {
        min_us: 500,
        max_us: 2400,
    };

    /// Tilt servo range (mechanically limited)
    pub const TILT_DEFAULT: Self = Self {
        min_us: 800,
        max_us: 2050,
    };

    /// Map a physical angle to a pulse width
    ///
    /// `center + trunc(angle * half_range / 90)`, clamped to the range.
    pub fn pulse_for(&self, angle: f32) -> PulseWidth {
        let min = self.min_us as i32;
        let max = self.max_us as i32;
        let center = (min + max) / 2;
        let half_range = (max - min) / 2;
        let offset = (clamp_angle(angle) * half_range as f32 / ANGLE_MAX) as i32;
        PulseWidth((center + offset).clamp(min, max) as u16)
    }
}

/// Board configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A servo range has min >= max or exceeds the frame
    InvalidServoRange,
    /// Frame period is zero or does not fit the 16-bit PWM counter
    InvalidFrame,
    /// Tick interval outside 1..=100 ms
    InvalidTick,
    /// Baud rate is zero
    InvalidBaud,
    /// Flood limit is zero
    InvalidFloodLimit,
}

/// Hardware configuration for the whole head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareConfig {
    pub pan: ServoCalibration,
    pub tilt: ServoCalibration,
    /// PWM frame period in microseconds (20000 = 50 Hz)
    pub frame_us: u32,
    /// Motion tick interval in milliseconds
    pub tick_ms: u32,
    /// UART baud rate for both transports
    pub baud: u32,
    /// Maximum accepted lines per second per transport
    pub flood_max_lines: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            pan: ServoCalibration::PAN_DEFAULT,
            tilt: ServoCalibration::TILT_DEFAULT,
            frame_us: 20_000,
            tick_ms: 10,
            baud: 115_200,
            flood_max_lines: DEFAULT_FLOOD_MAX_LINES,
        }
    }
}

impl HardwareConfig {
    /// Check the values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_us == 0 || self.frame_us > u16::MAX as u32 {
            return Err(ConfigError::InvalidFrame);
        }
        for servo in [self.pan, self.tilt] {
            if servo.min_us >= servo.max_us || servo.max_us as u32 >= self.frame_us {
                return Err(ConfigError::InvalidServoRange);
            }
        }
        if !(1..=100).contains(&self.tick_ms) {
            return Err(ConfigError::InvalidTick);
        }
        if self.baud == 0 {
            return Err(ConfigError::InvalidBaud);
        }
        if self.flood_max_lines == 0 {
            return Err(ConfigError::InvalidFloodLimit);
        }
        Ok(())
    }
}
