//! Persisted configuration record
//!
//! A fixed 60-byte little-endian layout:
//!
//! | offset | size | field                       |
//! |--------|------|-----------------------------|
//! | 0      | 4    | magic `PTJ1`                |
//! | 4      | 2    | version                     |
//! | 6      | 2    | reserved                    |
//! | 8      | 4    | default speed (f32)         |
//! | 12     | 1    | invert X                    |
//! | 13     | 1    | invert Y                    |
//! | 14     | 1    | position validity mask      |
//! | 15     | 1    | reserved                    |
//! | 16     | 20   | 5 x position X (f32)        |
//! | 36     | 20   | 5 x position Y (f32)        |
//! | 56     | 4    | CRC-32 (field zeroed)       |

use pantilt_hal::FAVORITE_SLOTS;

use super::types::{Position, Settings};
use crate::motion::{speed_in_range, DEFAULT_SPEED};

/// Encoded record size
pub const RECORD_LEN: usize = 60;

/// `PTJ1`
pub const RECORD_MAGIC: u32 = 0x5054_4A31;

/// Current layout version
pub const RECORD_VERSION: u16 = 1;

const SPEED_OFFSET: usize = 8;
const POS_X_OFFSET: usize = 16;
const POS_Y_OFFSET: usize = 36;
const CRC_OFFSET: usize = 56;

/// Reasons a stored record is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    LengthMismatch,
    BadMagic,
    BadVersion,
    BadChecksum,
}

/// CRC-32 (reflected, polynomial 0xEDB88320)
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32(bytes, offset))
}

/// Decoded form of the fixed record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistedConfig {
    pub default_speed: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Bit `i` set when position slot `i` holds a value
    pub valid_mask: u8,
    pub pos_x: [f32; FAVORITE_SLOTS],
    pub pos_y: [f32; FAVORITE_SLOTS],
}

impl PersistedConfig {
    /// Snapshot the persisted part of `settings`
    pub fn capture(settings: &Settings) -> Self {
        let mut record = Self {
            default_speed: settings.default_speed,
            invert_x: settings.invert_x,
            invert_y: settings.invert_y,
            valid_mask: 0,
            pos_x: [0.0; FAVORITE_SLOTS],
            pos_y: [0.0; FAVORITE_SLOTS],
        };
        for (i, position) in settings.positions.iter().enumerate() {
            if let Some(p) = position {
                record.valid_mask |= 1 << i;
                record.pos_x[i] = p.x;
                record.pos_y[i] = p.y;
            }
        }
        record
    }

    /// Copy the record into `settings`
    ///
    /// An out-of-range speed falls back to the default; coordinates are
    /// clamped.
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.default_speed = if speed_in_range(self.default_speed) {
            self.default_speed
        } else {
            DEFAULT_SPEED
        };
        settings.invert_x = self.invert_x;
        settings.invert_y = self.invert_y;
        for (i, slot) in settings.positions.iter_mut().enumerate() {
            *slot = (self.valid_mask & (1 << i) != 0)
                .then(|| Position::clamped(self.pos_x[i], self.pos_y[i]));
        }
    }

    /// Encode with magic, version and checksum
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
        bytes[4..6].copy_from_slice(&RECORD_VERSION.to_le_bytes());
        bytes[SPEED_OFFSET..SPEED_OFFSET + 4].copy_from_slice(&self.default_speed.to_le_bytes());
        bytes[12] = self.invert_x as u8;
        bytes[13] = self.invert_y as u8;
        bytes[14] = self.valid_mask;
        for i in 0..FAVORITE_SLOTS {
            let x = POS_X_OFFSET + i * 4;
            let y = POS_Y_OFFSET + i * 4;
            bytes[x..x + 4].copy_from_slice(&self.pos_x[i].to_le_bytes());
            bytes[y..y + 4].copy_from_slice(&self.pos_y[i].to_le_bytes());
        }
        let crc = crc32(&bytes);
        bytes[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        bytes
    }

    /// Decode and verify a stored record
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() != RECORD_LEN {
            return Err(RecordError::LengthMismatch);
        }
        if read_u32(bytes, 0) != RECORD_MAGIC {
            return Err(RecordError::BadMagic);
        }
        if u16::from_le_bytes([bytes[4], bytes[5]]) != RECORD_VERSION {
            return Err(RecordError::BadVersion);
        }

        let stored_crc = read_u32(bytes, CRC_OFFSET);
        let mut zeroed = [0u8; RECORD_LEN];
        zeroed[..CRC_OFFSET].copy_from_slice(&bytes[..CRC_OFFSET]);
        if crc32(&zeroed) != stored_crc {
            return Err(RecordError::BadChecksum);
        }

        let mut record = Self {
            default_speed: read_f32(bytes, SPEED_OFFSET),
            invert_x: bytes[12] != 0,
            invert_y: bytes[13] != 0,
            valid_mask: bytes[14] & 0x1F,
            pos_x: [0.0; FAVORITE_SLOTS],
            pos_y: [0.0; FAVORITE_SLOTS],
        };
        for i in 0..FAVORITE_SLOTS {
            record.pos_x[i] = read_f32(bytes, POS_X_OFFSET + i * 4);
            record.pos_y[i] = read_f32(bytes, POS_Y_OFFSET + i * 4);
        }
        Ok(record)
    }
}
