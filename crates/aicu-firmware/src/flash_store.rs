//! Settings persisted in the on-chip flash.
//!
//! Layout at [`SETTINGS_OFFSET`]: a little-endian `u32` magic, a `u32` blob
//! length, then the postcard-encoded [`Settings`]. A missing magic means
//! nothing was saved.

use alloc::vec;
use alloc::vec::Vec;

use aicu_core::app_state::{AppError, short_message};
use aicu_core::config::{Settings, SettingsStore};
use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;

use crate::debug_message;

/// Start of the `nvs` partition in the default partition table
pub const SETTINGS_OFFSET: u32 = 0x9000;

/// Bytes reserved for header and blob
const CAPACITY: usize = 4096;
const HEADER_LEN: usize = 8;
const MAGIC: u32 = 0xA1C0_5E77;

pub struct FlashSettingsStore {
    flash: FlashStorage<'static>,
    offset: u32,
}

impl FlashSettingsStore {
    pub fn new(flash: FlashStorage<'static>) -> Self {
        Self {
            flash,
            offset: SETTINGS_OFFSET,
        }
    }
}

impl SettingsStore for FlashSettingsStore {
    fn load(&mut self) -> Result<Option<Settings>, AppError> {
        let mut header = [0u8; HEADER_LEN];
        self.flash
            .read(self.offset, &mut header)
            .map_err(|e| AppError::Storage(debug_message(&e)))?;

        let [m0, m1, m2, m3, l0, l1, l2, l3] = header;
        if u32::from_le_bytes([m0, m1, m2, m3]) != MAGIC {
            return Ok(None);
        }
        let len = u32::from_le_bytes([l0, l1, l2, l3]) as usize;
        if len > CAPACITY - HEADER_LEN {
            return Err(AppError::Storage(short_message(&"corrupt settings length")));
        }

        let mut blob = vec![0u8; len];
        self.flash
            .read(self.offset + HEADER_LEN as u32, &mut blob)
            .map_err(|e| AppError::Storage(debug_message(&e)))?;
        Settings::from_bytes(&blob).map(Some)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), AppError> {
        let blob = settings.to_bytes()?;
        if blob.len() > CAPACITY - HEADER_LEN {
            return Err(AppError::Storage(short_message(&"settings too large")));
        }

        let mut image = Vec::with_capacity(HEADER_LEN + blob.len());
        image.extend_from_slice(&MAGIC.to_le_bytes());
        image.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        image.extend_from_slice(&blob);
        self.flash
            .write(self.offset, &image)
            .map_err(|e| AppError::Storage(debug_message(&e)))
    }

    fn clear(&mut self) -> Result<(), AppError> {
        // erased flash reads back as 0xFF, which never matches the magic
        self.flash
            .write(self.offset, &[0xFF; HEADER_LEN])
            .map_err(|e| AppError::Storage(debug_message(&e)))
    }
}
