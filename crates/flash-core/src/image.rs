//! Firmware image model

use bytes::Bytes;

/// Fixed load address for the application image.
pub const FLASH_LOAD_ADDRESS: u32 = 0x10000;

/// An immutable firmware image plus its flash load address.
///
/// Fetched once per flash attempt, never mutated, discarded after the
/// attempt.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    data: Bytes,
    load_address: u32,
}

impl FirmwareImage {
    /// Wrap image bytes at the fixed application load address.
    pub fn new(data: Bytes) -> Self {
        Self::at_address(data, FLASH_LOAD_ADDRESS)
    }

    /// Wrap image bytes at an explicit load address.
    pub fn at_address(data: Bytes, load_address: u32) -> Self {
        Self { data, load_address }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn load_address(&self) -> u32 {
        self.load_address
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
