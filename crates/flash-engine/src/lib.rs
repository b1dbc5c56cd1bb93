//! flash-engine - Chip-programming engine seam
//!
//! The orchestrator consumes the flashing protocol as an opaque service:
//! an engine is constructed over an open serial port at a fixed baud rate
//! with a terminal sink, detects the chip (bootloader handshake), then
//! writes image entries while reporting typed write events. The bootloader
//! wire protocol itself is owned by engine implementations; this crate
//! ships the contract plus a scripted simulator with failure injection.

pub mod error;
pub mod options;
pub mod sim;
pub mod terminal;

pub use error::EngineError;
pub use options::{CompressionMode, EraseMode, FlashFrequency, WriteOptions};
pub use sim::{FailurePoint, ScriptConfig, ScriptedEngine, ScriptedEngineFactory};
pub use terminal::{NullTerminal, TerminalSink};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use flash_transport::SerialPort;

/// Identity of the detected chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipInfo {
    /// Human-readable chip description (family, revision)
    pub description: String,
}

/// One image region to program
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Image bytes
    pub data: Bytes,
    /// Flash address to write at
    pub address: u32,
}

/// Typed events yielded during a write.
///
/// Progress events arrive in write order with monotonic `written` values;
/// a verification digest event follows the final progress event when
/// verification is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEvent {
    /// Bytes written so far out of the total
    Progress { written: u64, total: u64 },
    /// Post-write verification digest (hex)
    VerifyDigest(String),
}

/// Chip-programming protocol engine.
///
/// May take multiple seconds per operation; `detect_chip` internally
/// retries bootloader sync.
#[async_trait]
pub trait FlashEngine: Send {
    /// Run the bootloader handshake and identify the chip.
    async fn detect_chip(&mut self) -> Result<ChipInfo, EngineError>;

    /// Program the image entries, reporting events through `on_event`.
    async fn write_image(
        &mut self,
        entries: &[ImageEntry],
        options: &WriteOptions,
        on_event: &mut (dyn FnMut(WriteEvent) + Send),
    ) -> Result<(), EngineError>;
}

/// Factory constructing an engine over an open transport.
///
/// A fresh engine is created for every flash attempt.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        port: Arc<dyn SerialPort>,
        baud_rate: u32,
        terminal: Arc<dyn TerminalSink>,
    ) -> Box<dyn FlashEngine>;
}
