//! Axis motion
//!
//! Angles are in degrees, `-90..=90`, with 0 at the servo center. A move is
//! a linear interpolation from the angle at start time to a target over a
//! fixed duration.

pub mod axis;
pub mod profile;
pub mod timing;

pub use axis::{clamp_angle, Axis, AxisMask, ANGLE_MAX, ANGLE_MIN};
pub use profile::{AxisState, AxisUpdate, MotionProfile};
pub use timing::{
    duration_from_speed, resolve_durations, seconds_to_ms, speed_in_range, Timing, DEFAULT_SPEED,
    MAX_DURATION_S, MAX_SPEED, MIN_SPEED,
};
