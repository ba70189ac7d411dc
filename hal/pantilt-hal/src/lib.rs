//! Hardware abstraction traits for the pan/tilt head
//!
//! Chip-specific crates implement these traits; the core logic only
//! ever sees the traits.

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod servo;

pub use flash::{FlashError, FlashStorage, StorageKey, FAVORITE_SLOTS};
pub use servo::{PulseWidth, ServoChannel, ServoPwm};
