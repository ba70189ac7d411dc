//! RP2040-specific HAL for the pan/tilt head
//!
//! Implements the `pantilt-hal` traits on RP2040 peripherals:
//!
//! - Flash storage driver (implements `pantilt_hal::FlashStorage`)
//! - Two-channel servo PWM on one PWM slice (implements `pantilt_hal::ServoPwm`)

#![no_std]

pub mod flash;
pub mod servo;

// Re-export shared traits from pantilt-hal for convenience
pub use pantilt_hal::{FlashStorage as FlashStorageTrait, ServoPwm as ServoPwmTrait, StorageKey};
