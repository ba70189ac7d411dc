//! Hardware and transport abstraction traits
//!
//! These traits define the interface between the application logic
//! and the board-specific implementations.

pub mod output;
pub mod sink;

pub use output::{PulseOutput, ServoOutput};
pub use sink::LineSink;
