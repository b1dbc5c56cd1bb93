//! Write options for the flashing engine

use serde::{Deserialize, Serialize};

/// Erase behavior before writing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EraseMode {
    /// Erase only the regions being written
    #[default]
    Keep,
    /// Erase the whole flash first
    All,
}

/// Transfer compression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Leave the engine's default in place
    #[default]
    Keep,
    /// Compress blocks on the wire
    Compressed,
    /// Send raw blocks
    Uncompressed,
}

/// SPI flash frequency to program the image for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashFrequency {
    /// Leave the image header untouched
    Keep,
    #[serde(rename = "20m")]
    Mhz20,
    #[serde(rename = "26m")]
    Mhz26,
    /// Standard frequency for the targeted module
    #[default]
    #[serde(rename = "40m")]
    Mhz40,
    #[serde(rename = "80m")]
    Mhz80,
}

impl std::fmt::Display for FlashFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Mhz20 => write!(f, "20m"),
            Self::Mhz26 => write!(f, "26m"),
            Self::Mhz40 => write!(f, "40m"),
            Self::Mhz80 => write!(f, "80m"),
        }
    }
}

/// Options for one `write_image` call.
///
/// The defaults are the single fixed configuration the session uses:
/// keep erase and compression behavior, 40 MHz flash frequency, verify
/// after writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub erase: EraseMode,
    pub compression: CompressionMode,
    pub flash_freq: FlashFrequency,
    pub verify: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            erase: EraseMode::Keep,
            compression: CompressionMode::Keep,
            flash_freq: FlashFrequency::Mhz40,
            verify: true,
        }
    }
}
