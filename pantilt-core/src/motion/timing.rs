//! Move duration math

use super::axis::AxisMask;

/// Slowest accepted speed in degrees per second
pub const MIN_SPEED: f32 = 0.1;

/// Fastest accepted speed in degrees per second
pub const MAX_SPEED: f32 = 1000.0;

/// Power-on default speed in degrees per second
pub const DEFAULT_SPEED: f32 = 90.0;

/// Longest accepted explicit duration in seconds
pub const MAX_DURATION_S: f32 = 3600.0;

/// Whether `speed` is inside the accepted range
pub fn speed_in_range(speed: f32) -> bool {
    (MIN_SPEED..=MAX_SPEED).contains(&speed)
}

/// Convert seconds to milliseconds, rounding half up
pub fn seconds_to_ms(seconds: f32) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    let ms = seconds * 1000.0;
    let whole = ms as u32;
    if ms - whole as f32 >= 0.5 {
        whole.saturating_add(1)
    } else {
        whole
    }
}

/// Time to travel from `start` to `target` at `speed` degrees per second
pub fn duration_from_speed(start: f32, target: f32, speed: f32) -> u32 {
    let speed = if speed < MIN_SPEED { MIN_SPEED } else { speed };
    let delta = target - start;
    let delta = if delta < 0.0 { -delta } else { delta };
    seconds_to_ms(delta / speed)
}

/// Optional timing fields of a motion request
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timing {
    /// Explicit duration in seconds
    pub duration_s: Option<f32>,
    /// Speed in degrees per second
    pub speed: Option<f32>,
}

/// Per-axis durations in milliseconds for a move from `from` to `to`
///
/// An explicit duration wins over speed. Unselected axes get 0. Returns
/// `None` if the duration or speed is out of range.
pub fn resolve_durations(
    mask: AxisMask,
    from: (f32, f32),
    to: (f32, f32),
    timing: Timing,
    default_speed: f32,
) -> Option<(u32, u32)> {
    if let Some(seconds) = timing.duration_s {
        if !(0.0..=MAX_DURATION_S).contains(&seconds) {
            return None;
        }
        let ms = seconds_to_ms(seconds);
        return Some((
            if mask.x { ms } else { 0 },
            if mask.y { ms } else { 0 },
        ));
    }

    let speed = timing.speed.unwrap_or(default_speed);
    if !speed_in_range(speed) {
        return None;
    }
    Some((
        if mask.x { duration_from_speed(from.0, to.0, speed) } else { 0 },
        if mask.y { duration_from_speed(from.1, to.1, speed) } else { 0 },
    ))
}
