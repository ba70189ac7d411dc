//! Host test doubles

use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::vec::Vec;

use pantilt_hal::{FlashError, FlashStorage, StorageKey};
use pantilt_protocol::Transport;

use crate::traits::{LineSink, ServoOutput};

/// In-memory key/value flash with failure injection
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub entries: BTreeMap<u8, Vec<u8>>,
    pub fail_writes: bool,
    pub fail_erase: bool,
    pub writes: usize,
}

impl MemoryStorage {
    pub fn get(&self, key: StorageKey) -> Option<&[u8]> {
        self.entries.get(&key.as_u8()).map(|v| v.as_slice())
    }
}

impl FlashStorage for MemoryStorage {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let value = self
            .entries
            .get(&key.as_u8())
            .ok_or(FlashError::NotFound)?;
        if value.len() > buffer.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        self.writes += 1;
        self.entries.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        self.entries.remove(&key.as_u8());
        Ok(())
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        if self.fail_erase {
            return Err(FlashError::Flash);
        }
        self.entries.clear();
        Ok(())
    }
}

/// Sink that records every line with its destination
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<(Transport, String)>,
}

impl RecordingSink {
    /// Lines sent to one transport
    pub fn on(&self, transport: Transport) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(t, _)| *t == transport)
            .map(|(_, l)| l.as_str())
            .collect()
    }

    /// Take and clear everything sent to USB
    pub fn take_usb(&mut self) -> Vec<String> {
        let lines = self
            .lines
            .iter()
            .filter(|(t, _)| *t == Transport::Usb)
            .map(|(_, l)| l.clone())
            .collect();
        self.lines.clear();
        lines
    }
}

impl LineSink for RecordingSink {
    fn send_line(&mut self, dest: Transport, line: &str) {
        self.lines.push((dest, line.to_string()));
    }
}

/// Output that records applied angles
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub applied: Vec<(f32, f32)>,
}

impl RecordingOutput {
    pub fn last(&self) -> Option<(f32, f32)> {
        self.applied.last().copied()
    }
}

impl ServoOutput for RecordingOutput {
    fn apply(&mut self, x: f32, y: f32) {
        self.applied.push((x, y));
    }
}
