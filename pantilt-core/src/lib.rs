//! Board-agnostic core logic for the pan/tilt head
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Output traits (servo output, reply sink)
//! - Axis motion profiles and duration math
//! - Step queue and scheduler
//! - Settings, persisted record and persistence
//! - Command interpreter and macro runner

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod controller;
pub mod error;
pub mod motion;
pub mod persist;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, TransportEvent};
pub use error::{CommandError, ErrorCode};
