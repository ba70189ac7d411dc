//! Settings persistence
//!
//! Stores the fixed record under `cfg` and each command favorite under its
//! own `favN` key. Loading rejects any record that fails validation and
//! falls back to defaults.

use pantilt_hal::{FlashError, FlashStorage, StorageKey, FAVORITE_SLOTS};
use pantilt_protocol::text::clip;

use crate::config::{PersistedConfig, RecordError, Script, Settings, MAX_SCRIPT_LEN, RECORD_LEN};

/// Read buffer size; stored scripts longer than [`MAX_SCRIPT_LEN`] are
/// truncated, anything longer than this buffer is unreadable
pub const READ_BUFFER_LEN: usize = 4096;

/// Why stored settings could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// The record could not be read
    Storage(FlashError),
    /// The record was read but is invalid
    Record(RecordError),
}

impl From<FlashError> for LoadError {
    fn from(e: FlashError) -> Self {
        LoadError::Storage(e)
    }
}

impl From<RecordError> for LoadError {
    fn from(e: RecordError) -> Self {
        LoadError::Record(e)
    }
}

/// Persistence failures, reported as `write_failed` / `clear_failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    WriteFailed(FlashError),
    ClearFailed(FlashError),
}

/// Result of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveOutcome {
    /// Nothing was dirty, storage untouched
    NoChanges,
    /// Everything was written
    Persisted,
}

/// Settings store over a [`FlashStorage`]
pub struct Persistence<S> {
    storage: S,
    buffer: [u8; READ_BUFFER_LEN],
}

impl<S: FlashStorage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            buffer: [0; READ_BUFFER_LEN],
        }
    }

    /// Get the underlying storage
    pub fn storage(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Load stored settings
    ///
    /// On error `settings` holds factory defaults. On success the dirty flag
    /// is cleared.
    pub fn load(&mut self, settings: &mut Settings) -> Result<(), LoadError> {
        settings.apply_defaults();

        let len = self.storage.read(StorageKey::Config, &mut self.buffer)?;
        if len != RECORD_LEN {
            return Err(RecordError::LengthMismatch.into());
        }
        let record = PersistedConfig::decode(&self.buffer[..len])?;
        record.apply_to(settings);

        for (index, slot) in settings.scripts.iter_mut().enumerate() {
            *slot = self.read_script(index);
        }
        settings.dirty = false;
        Ok(())
    }

    fn read_script(&mut self, index: usize) -> Option<Script> {
        let key = StorageKey::favorite(index + 1)?;
        let len = self.storage.read(key, &mut self.buffer).ok()?;
        let text = core::str::from_utf8(&self.buffer[..len]).ok()?;
        if text.is_empty() {
            return None;
        }
        Script::try_from(clip(text, MAX_SCRIPT_LEN)).ok()
    }

    /// Write settings if they are dirty
    ///
    /// Every key is attempted even after a failure; dirty is cleared only
    /// when all writes succeed.
    pub fn save(&mut self, settings: &mut Settings) -> Result<SaveOutcome, PersistError> {
        if !settings.dirty {
            return Ok(SaveOutcome::NoChanges);
        }

        let record = PersistedConfig::capture(settings).encode();
        let mut result = self.storage.write(StorageKey::Config, &record);

        for index in 0..FAVORITE_SLOTS {
            let Some(key) = StorageKey::favorite(index + 1) else {
                continue;
            };
            let outcome = match settings.script(index) {
                Some(script) => self.storage.write(key, clip(script, MAX_SCRIPT_LEN).as_bytes()),
                None => self.storage.remove(key),
            };
            if result.is_ok() {
                result = outcome;
            }
        }

        result.map_err(PersistError::WriteFailed)?;
        settings.dirty = false;
        Ok(SaveOutcome::Persisted)
    }

    /// Erase all stored data and reset `settings` to defaults
    ///
    /// Defaults are applied even when the erase fails.
    pub fn factory_reset(&mut self, settings: &mut Settings) -> Result<(), PersistError> {
        let result = self.storage.erase_all();
        settings.apply_defaults();
        result.map_err(PersistError::ClearFailed)
    }
}
