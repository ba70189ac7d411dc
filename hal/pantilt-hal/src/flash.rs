//! Flash storage abstractions
//!
//! A small key-value store for the persisted settings record and the
//! favorite scripts. All keys live in one flash partition.

/// Number of favorite script slots with their own storage key
pub const FAVORITE_SLOTS: usize = 5;

/// Storage keys for persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Binary settings record ("cfg")
    Config,
    /// Favorite script for slot 1..=5 ("fav1".."fav5")
    ///
    /// Slots outside that range are clamped onto it.
    Favorite(u8),
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        match self {
            StorageKey::Config => 0,
            StorageKey::Favorite(slot) => slot.clamp(1, FAVORITE_SLOTS as u8),
        }
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::Config),
            1..=5 => Some(StorageKey::Favorite(value)),
            _ => None,
        }
    }

    /// Key for a 1-based favorite slot
    pub fn favorite(slot: usize) -> Option<Self> {
        if (1..=FAVORITE_SLOTS).contains(&slot) {
            Some(StorageKey::Favorite(slot as u8))
        } else {
            None
        }
    }

    /// Human-readable key name
    pub fn name(self) -> &'static str {
        match self.as_u8() {
            0 => "cfg",
            1 => "fav1",
            2 => "fav2",
            3 => "fav3",
            4 => "fav4",
            _ => "fav5",
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Storage is full
    Full,
}

/// Flash storage trait
///
/// Operations block until the flash work is complete. Callers accept the
/// stall: persistence is only ever user-triggered.
pub trait FlashStorage {
    /// Read a value by key into the provided buffer
    ///
    /// Returns the number of bytes read. A key that was removed reads as
    /// `NotFound`.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError>;

    /// Write a value by key, replacing any previous value
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError>;

    /// Remove a key
    ///
    /// Removing a key that does not exist is not an error.
    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError>;

    /// Erase all stored data
    fn erase_all(&mut self) -> Result<(), FlashError>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
