//! Scripted engine simulator
//!
//! Plays the role of a real protocol engine for tests, dry runs, and the
//! CLI's simulated mode: it exercises the serial port seam, yields the
//! same event sequence a real engine would, and supports failure
//! injection at each step of the flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tokio::sync::Notify;
use tracing::debug;

use flash_transport::SerialPort;

use crate::error::EngineError;
use crate::options::WriteOptions;
use crate::terminal::TerminalSink;
use crate::{ChipInfo, EngineFactory, FlashEngine, ImageEntry, WriteEvent};

/// Leading bytes of the bootloader sync frame the simulator emits.
const SYNC_PREAMBLE: [u8; 5] = [0xC0, 0x00, 0x08, 0x24, 0x00];

/// Step at which an injected failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Bootloader handshake times out
    Handshake,
    /// Write errors after this many bytes have been reported
    Write { after_bytes: u64 },
    /// Verification reports a mismatch after a complete write
    Verify,
}

/// Behavior script for the simulator
#[derive(Clone)]
pub struct ScriptConfig {
    /// Chip description returned by detection
    pub chip_description: String,
    /// Bytes reported per progress event
    pub chunk_size: usize,
    /// Simulated latency per operation
    pub latency_ms: u64,
    /// Injected failure, if any
    pub failure: Option<FailurePoint>,
    /// When set, the engine waits on this gate before writing; lets tests
    /// hold a session mid-attempt
    pub write_gate: Option<Arc<Notify>>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            chip_description: "ESP32-D0WD-V3 (revision v3.1)".to_string(),
            chunk_size: 4096,
            latency_ms: 0,
            failure: None,
            write_gate: None,
        }
    }
}

/// Simulated flashing engine over a live serial port
pub struct ScriptedEngine {
    port: Arc<dyn SerialPort>,
    baud_rate: u32,
    terminal: Arc<dyn TerminalSink>,
    config: ScriptConfig,
}

impl ScriptedEngine {
    pub fn new(
        port: Arc<dyn SerialPort>,
        baud_rate: u32,
        terminal: Arc<dyn TerminalSink>,
        config: ScriptConfig,
    ) -> Self {
        Self {
            port,
            baud_rate,
            terminal,
            config,
        }
    }

    async fn latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

#[async_trait]
impl FlashEngine for ScriptedEngine {
    async fn detect_chip(&mut self) -> Result<ChipInfo, EngineError> {
        if !self.port.is_open().await {
            return Err(EngineError::Transport("serial port is not open".to_string()));
        }

        self.terminal.clean();
        self.terminal
            .write_line(&format!("Serial port ready at {} baud", self.baud_rate));
        self.terminal.write_line("Connecting...");

        self.port.write_all(&SYNC_PREAMBLE).await?;
        self.latency().await;

        if matches!(self.config.failure, Some(FailurePoint::Handshake)) {
            return Err(EngineError::Sync(
                "no response from bootloader after 7 attempts".to_string(),
            ));
        }

        debug!(chip = %self.config.chip_description, "chip detected");
        Ok(ChipInfo {
            description: self.config.chip_description.clone(),
        })
    }

    async fn write_image(
        &mut self,
        entries: &[ImageEntry],
        options: &WriteOptions,
        on_event: &mut (dyn FnMut(WriteEvent) + Send),
    ) -> Result<(), EngineError> {
        if entries.is_empty() || entries.iter().any(|e| e.data.is_empty()) {
            return Err(EngineError::EmptyImage);
        }

        if let Some(gate) = &self.config.write_gate {
            gate.notified().await;
        }

        let total: u64 = entries.iter().map(|e| e.data.len() as u64).sum();
        let mut written: u64 = 0;
        let mut hasher = Sha256::new();

        on_event(WriteEvent::Progress { written: 0, total });

        for entry in entries {
            self.terminal.write_line(&format!(
                "Writing {} bytes at {:#06x}",
                entry.data.len(),
                entry.address
            ));
            for chunk in entry.data.chunks(self.config.chunk_size) {
                self.port.write_all(chunk).await?;
                hasher.update(chunk);
                written += chunk.len() as u64;
                self.latency().await;

                if let Some(FailurePoint::Write { after_bytes }) = self.config.failure {
                    if written >= after_bytes {
                        return Err(EngineError::Write(format!(
                            "timed out waiting for packet ack at offset {:#x}",
                            entry.address as u64 + written
                        )));
                    }
                }

                on_event(WriteEvent::Progress { written, total });
            }
        }

        if matches!(self.config.failure, Some(FailurePoint::Verify)) {
            return Err(EngineError::Verify(
                "digest mismatch after write".to_string(),
            ));
        }

        if options.verify {
            let digest = hex::encode(hasher.finalize());
            self.terminal.write_line("Hash of data verified.");
            on_event(WriteEvent::VerifyDigest(digest));
        }

        Ok(())
    }
}

/// Factory for [`ScriptedEngine`]s.
///
/// The script is shared behind a lock so tests can change the injected
/// failure between attempts on the same session.
#[derive(Default)]
pub struct ScriptedEngineFactory {
    config: RwLock<ScriptConfig>,
}

impl ScriptedEngineFactory {
    pub fn new(config: ScriptConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the injected failure for subsequent attempts.
    pub fn set_failure(&self, failure: Option<FailurePoint>) {
        self.config.write().failure = failure;
    }

    /// Install a gate the next engine will wait on before writing.
    pub fn set_write_gate(&self, gate: Option<Arc<Notify>>) {
        self.config.write().write_gate = gate;
    }
}

impl EngineFactory for ScriptedEngineFactory {
    fn create(
        &self,
        port: Arc<dyn SerialPort>,
        baud_rate: u32,
        terminal: Arc<dyn TerminalSink>,
    ) -> Box<dyn FlashEngine> {
        Box::new(ScriptedEngine::new(
            port,
            baud_rate,
            terminal,
            self.config.read().clone(),
        ))
    }
}
