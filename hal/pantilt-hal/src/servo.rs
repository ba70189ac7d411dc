//! Servo PWM abstraction

/// Servo channel on the pan/tilt head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoChannel {
    /// X axis (pan)
    Pan,
    /// Y axis (tilt)
    Tilt,
}

/// Servo pulse width in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseWidth(pub u16);

impl PulseWidth {
    /// Pulse width in microseconds
    pub fn micros(self) -> u16 {
        self.0
    }
}

/// Trait for hobby-servo PWM outputs
///
/// Implementations hold the PWM frame rate fixed and only change the
/// high time of each frame.
pub trait ServoPwm {
    /// Set the pulse width for one channel
    fn set_pulse(&mut self, channel: ServoChannel, pulse: PulseWidth);
}
