//! Axes and axis masks

/// Lowest commandable angle in degrees
pub const ANGLE_MIN: f32 = -90.0;

/// Highest commandable angle in degrees
pub const ANGLE_MAX: f32 = 90.0;

/// Clamp an angle to the commandable range
pub fn clamp_angle(angle: f32) -> f32 {
    angle.clamp(ANGLE_MIN, ANGLE_MAX)
}

/// Servo axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Pan
    X,
    /// Tilt
    Y,
}

impl Axis {
    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// Which axes a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
}

impl AxisMask {
    pub const X: Self = Self { x: true, y: false };
    pub const Y: Self = Self { x: false, y: true };
    pub const XY: Self = Self { x: true, y: true };

    /// Parse `x`, `y` or `xy`, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("x") {
            Some(Self::X)
        } else if name.eq_ignore_ascii_case("y") {
            Some(Self::Y)
        } else if name.eq_ignore_ascii_case("xy") {
            Some(Self::XY)
        } else {
            None
        }
    }

    /// Whether the mask selects `axis`
    pub fn has(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Both axes selected
    pub fn is_both(self) -> bool {
        self.x && self.y
    }
}
