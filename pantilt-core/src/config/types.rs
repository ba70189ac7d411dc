//! Runtime settings
//!
//! Everything the commands can change that survives a reboot: default
//! speed, inversion flags, position favorites and command favorites.

use heapless::String;
use pantilt_hal::FAVORITE_SLOTS;
use pantilt_protocol::MAX_LINE_LEN;

use crate::motion::{clamp_angle, DEFAULT_SPEED};

/// Maximum stored script length in bytes
pub const MAX_SCRIPT_LEN: usize = MAX_LINE_LEN;

/// Stored multi-line command favorite
pub type Script = String<MAX_SCRIPT_LEN>;

/// Saved (x, y) position favorite
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Position with both coordinates clamped to the axis range
    pub fn clamped(x: f32, y: f32) -> Self {
        Self {
            x: clamp_angle(x),
            y: clamp_angle(y),
        }
    }
}

/// Convert a 1-based wire slot number into an index
pub fn slot_index(slot: i32) -> Option<usize> {
    if (1..=FAVORITE_SLOTS as i32).contains(&slot) {
        Some((slot - 1) as usize)
    } else {
        None
    }
}

/// Persistent settings plus the dirty flag
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Speed used when a motion command gives neither `dur` nor `speed`
    pub default_speed: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    pub positions: [Option<Position>; FAVORITE_SLOTS],
    pub scripts: [Option<Script>; FAVORITE_SLOTS],
    /// Changed since the last successful save
    pub dirty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_speed: DEFAULT_SPEED,
            invert_x: false,
            invert_y: false,
            positions: [None; FAVORITE_SLOTS],
            scripts: core::array::from_fn(|_| None),
            dirty: false,
        }
    }
}

impl Settings {
    /// Reset to factory defaults in place
    pub fn apply_defaults(&mut self) {
        self.default_speed = DEFAULT_SPEED;
        self.invert_x = false;
        self.invert_y = false;
        self.positions = [None; FAVORITE_SLOTS];
        for script in self.scripts.iter_mut() {
            *script = None;
        }
        self.dirty = false;
    }

    /// Script in a slot, if one is stored
    pub fn script(&self, index: usize) -> Option<&str> {
        self.scripts
            .get(index)
            .and_then(|s| s.as_ref())
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Whether any state differs from what was last persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as changed
    pub fn touch(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_bounds() {
        assert_eq!(slot_index(0), None);
        assert_eq!(slot_index(1), Some(0));
        assert_eq!(slot_index(5), Some(4));
        assert_eq!(slot_index(6), None);
        assert_eq!(slot_index(-1), None);
    }

    #[test]
    fn test_apply_defaults_clears_everything() {
        let mut settings = Settings::default();
        settings.default_speed = 12.0;
        settings.invert_y = true;
        settings.positions[2] = Some(Position::clamped(10.0, 200.0));
        settings.scripts[0] = Some(Script::try_from("{\"cmd\":\"center\"}").unwrap());
        settings.touch();

        settings.apply_defaults();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_empty_script_reads_as_absent() {
        let mut settings = Settings::default();
        settings.scripts[1] = Some(Script::new());
        assert_eq!(settings.script(1), None);
        assert_eq!(settings.script(9), None);
    }

    #[test]
    fn test_position_clamped() {
        let p = Position::clamped(-120.0, 45.5);
        assert_eq!(p, Position { x: -90.0, y: 45.5 });
    }
}
