//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage
//! in the last 64KB of flash.
//!
//! Implements the `FlashStorage` trait from `pantilt-hal`. The trait is
//! synchronous, so every operation drives the async flash future to
//! completion with `block_on`.

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

// Re-export shared types from pantilt-hal
pub use pantilt_hal::flash::{FlashError, StorageKey};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024; // 64KB for settings and favorites
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Flash erase size for RP2040
pub const FLASH_ERASE_SIZE: usize = ERASE_SIZE;

/// Flash range for the config partition
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch size for one stored item (key, header and a full favorite script)
const DATA_BUFFER_LEN: usize = 4096;

/// RP2040 Flash storage implementation
///
/// Removed keys are stored as empty values, which read back as `NotFound`.
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    data_buffer: [u8; DATA_BUFFER_LEN],
}

impl<'d> Rp2040FlashStorage<'d> {
    /// Create a new flash storage instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            data_buffer: [0u8; DATA_BUFFER_LEN],
        }
    }
}

impl<'d> pantilt_hal::FlashStorage for Rp2040FlashStorage<'d> {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let result = block_on(map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
        ));

        match result {
            Ok(Some([])) | Ok(None) => Err(FlashError::NotFound),
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Err(_) => Err(FlashError::Storage),
        }
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        block_on(map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
            &data,
        ))
        .map_err(|err| match err {
            sequential_storage::Error::FullStorage => FlashError::Full,
            _ => FlashError::Storage,
        })
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        let empty: &[u8] = &[];
        self.write(key, empty)
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        block_on(self.flash.erase(CONFIG_RANGE.start, CONFIG_RANGE.end))
            .map_err(|_| FlashError::Flash)
    }
}
