//! Flashing engine errors

use thiserror::Error;

/// Errors reported by a flashing engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bootloader handshake failed or timed out
    #[error("Bootloader sync failed: {0}")]
    Sync(String),

    /// Chip responded but could not be identified
    #[error("Chip not detected: {0}")]
    ChipNotDetected(String),

    /// Programming a flash region failed
    #[error("Flash write failed: {0}")]
    Write(String),

    /// Post-write verification mismatch
    #[error("Verification failed: {0}")]
    Verify(String),

    /// An empty payload was handed to the engine
    #[error("Cannot flash an empty image")]
    EmptyImage,

    /// Underlying serial transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation exceeded its deadline
    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

impl From<flash_transport::TransportError> for EngineError {
    fn from(err: flash_transport::TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}
