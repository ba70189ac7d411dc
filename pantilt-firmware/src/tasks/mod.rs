//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod ble_link;
pub mod control;
pub mod serial_rx;
pub mod serial_tx;
pub mod tick;

pub use ble_link::ble_link_task;
pub use control::control_task;
pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;
pub use tick::tick_task;
