//! Per-axis motion profile and state

use super::axis::clamp_angle;

/// Active linear move on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionProfile {
    /// Angle when the move started
    pub start: f32,
    /// Angle at the end of the move
    pub target: f32,
    /// Start time in milliseconds
    pub started_at: u32,
    /// Move duration in milliseconds (never 0)
    pub duration_ms: u32,
    /// Id of the request that started the move
    pub ref_id: u32,
}

impl MotionProfile {
    fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.started_at)
    }

    /// Whether the move has run its full duration at `now_ms`
    pub fn is_complete(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) >= self.duration_ms
    }

    /// Interpolated angle at `now_ms`
    pub fn angle_at(&self, now_ms: u32) -> f32 {
        let elapsed = self.elapsed(now_ms);
        if elapsed >= self.duration_ms {
            return self.target;
        }
        let t = elapsed as f32 / self.duration_ms as f32;
        self.start + (self.target - self.start) * t
    }
}

/// Result of advancing one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisUpdate {
    /// No active move
    Idle,
    /// Move in progress, angle changed
    Moving,
    /// Move finished this update; carries the request id
    Finished(u32),
}

/// Angle plus optional active move for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisState {
    angle: f32,
    profile: Option<MotionProfile>,
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisState {
    /// Axis at center, not moving
    pub const fn new() -> Self {
        Self {
            angle: 0.0,
            profile: None,
        }
    }

    /// Current angle in degrees
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Whether a move is active
    pub fn is_moving(&self) -> bool {
        self.profile.is_some()
    }

    /// Active move, if any
    pub fn profile(&self) -> Option<&MotionProfile> {
        self.profile.as_ref()
    }

    /// Start a move toward `target`
    ///
    /// A zero duration jumps immediately and leaves the axis idle.
    pub fn start_move(&mut self, target: f32, duration_ms: u32, ref_id: u32, now_ms: u32) {
        let target = clamp_angle(target);
        if duration_ms == 0 {
            self.angle = target;
            self.profile = None;
            return;
        }
        self.profile = Some(MotionProfile {
            start: self.angle,
            target,
            started_at: now_ms,
            duration_ms,
            ref_id,
        });
    }

    /// Stop any active move, holding the current angle
    pub fn stop(&mut self) {
        self.profile = None;
    }

    /// Stop and jump to `angle`
    pub fn reset_to(&mut self, angle: f32) {
        self.profile = None;
        self.angle = clamp_angle(angle);
    }

    /// Mirror the axis frame (used when inversion is toggled)
    ///
    /// The angle and any active move are negated so that the physical
    /// output does not jump.
    pub fn negate(&mut self) {
        self.angle = -self.angle;
        if let Some(profile) = self.profile.as_mut() {
            profile.start = -profile.start;
            profile.target = -profile.target;
        }
    }

    /// Advance the active move to `now_ms`
    pub fn update(&mut self, now_ms: u32) -> AxisUpdate {
        let Some(profile) = self.profile else {
            return AxisUpdate::Idle;
        };
        if profile.is_complete(now_ms) {
            self.angle = profile.target;
            self.profile = None;
            AxisUpdate::Finished(profile.ref_id)
        } else {
            self.angle = profile.angle_at(now_ms);
            AxisUpdate::Moving
        }
    }
}
