//! Servo output trait

use pantilt_hal::{ServoChannel, ServoPwm};

use crate::config::ServoCalibration;

/// The "apply output" contract of the actuation layer
///
/// Angles are physical angles in degrees, inversion already applied.
pub trait ServoOutput {
    /// Drive both servos to the given angles
    fn apply(&mut self, x: f32, y: f32);
}

/// [`ServoOutput`] over a raw pulse-width PWM driver
pub struct PulseOutput<P> {
    pwm: P,
    pan: ServoCalibration,
    tilt: ServoCalibration,
}

impl<P: ServoPwm> PulseOutput<P> {
    /// Create an output using per-channel pulse calibration
    pub fn new(pwm: P, pan: ServoCalibration, tilt: ServoCalibration) -> Self {
        Self { pwm, pan, tilt }
    }

    /// Get the underlying PWM driver
    pub fn pwm(&mut self) -> &mut P {
        &mut self.pwm
    }
}

impl<P: ServoPwm> ServoOutput for PulseOutput<P> {
    fn apply(&mut self, x: f32, y: f32) {
        self.pwm.set_pulse(ServoChannel::Pan, self.pan.pulse_for(x));
        self.pwm.set_pulse(ServoChannel::Tilt, self.tilt.pulse_for(y));
    }
}
