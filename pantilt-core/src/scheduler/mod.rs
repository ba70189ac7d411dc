//! Step queue and scheduler
//!
//! Motion commands become [`QueueItem`]s. The scheduler drives at most one
//! of them at a time, advances axis interpolation on every tick, and
//! promotes the next queued step once both axes are idle.

pub mod executor;
pub mod queue;
pub mod step;

pub use executor::{MotionEvent, Scheduler, TickOutcome, MAX_TICK_EVENTS, STEP_TIMEOUT_GRACE_MS};
pub use queue::{StepQueue, QUEUE_CAPACITY};
pub use step::{ActiveStep, QueueItem, StepKind};
