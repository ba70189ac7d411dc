//! Configuration types
//!
//! Board configuration parsed from the embedded TOML, the runtime settings
//! the commands edit, and their persisted binary record.

pub mod hardware;
pub mod record;
pub mod toml;
pub mod types;

pub use hardware::*;
pub use record::{crc32, PersistedConfig, RecordError, RECORD_LEN};
pub use types::*;
