//! Hobby-servo PWM on one RP2040 PWM slice
//!
//! Channel A drives pan, channel B drives tilt. The slice counter is
//! divided down to 1 MHz so compare values are pulse widths in
//! microseconds.

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use fixed::types::U12F4;
use pantilt_hal::{PulseWidth, ServoChannel, ServoPwm};

/// System clock divider that gives one counter tick per microsecond
/// at the default 125 MHz clock
pub const MICROSECOND_DIVIDER: u16 = 125;

/// Two servo outputs sharing one PWM slice
pub struct Rp2040ServoPwm<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
}

impl<'d> Rp2040ServoPwm<'d> {
    /// Take over a slice configured with both outputs
    ///
    /// `frame_us` is the servo frame period (20 000 for 50 Hz). Both
    /// outputs start with `initial` pulses so the servos hold center.
    pub fn new(mut pwm: Pwm<'d>, frame_us: u16, initial: (PulseWidth, PulseWidth)) -> Self {
        let mut config = PwmConfig::default();
        config.divider = U12F4::from_num(MICROSECOND_DIVIDER);
        config.top = frame_us.saturating_sub(1);
        config.compare_a = initial.0.micros();
        config.compare_b = initial.1.micros();
        pwm.set_config(&config);
        Self { pwm, config }
    }
}

impl<'d> ServoPwm for Rp2040ServoPwm<'d> {
    fn set_pulse(&mut self, channel: ServoChannel, pulse: PulseWidth) {
        let compare = pulse.micros().min(self.config.top);
        let slot = match channel {
            ServoChannel::Pan => &mut self.config.compare_a,
            ServoChannel::Tilt => &mut self.config.compare_b,
        };
        if *slot == compare {
            return;
        }
        *slot = compare;
        self.pwm.set_config(&self.config);
    }
}
