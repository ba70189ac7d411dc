//! Pan/Tilt JSON-line protocol
//!
//! Commands arrive as one JSON object per line over the USB serial link or
//! the BLE UART link. Replies and asynchronous events leave the same way.
//!
//! ```text
//! -> {"cmd":"set","axis":"x","value":45,"dur":0.7,"id":7}
//! <- {"ok":true,"id":7,"subsystem":"usb","msg":"executing"}
//! <- {"ok":true,"event":"done","axis":"x","ref":7,"subsystem":"usb"}
//! ```
//!
//! Requests are not fully parsed. The [`fields`] scanner only locates the
//! keys a command needs, so a missing key and a malformed value both read
//! as "absent".

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod fields;
pub mod framing;
pub mod reply;
pub mod routing;
pub mod text;

pub use fields::{bool_field, has_string_field, int_field, number_field, string_field};
pub use framing::{FrameError, FramerStats, LineFramer};
pub use reply::{
    FavoriteSummary, JsonLine, QueueMode, ReplyError, ReplyLine, StateSnapshot, StepSummary,
    MAX_REPLY_LEN,
};
pub use routing::{Destinations, RouteTag, RouteTags, Routing, Transport};

/// Longest command line accepted, in bytes. Longer lines are truncated.
pub const MAX_LINE_LEN: usize = 3600;
