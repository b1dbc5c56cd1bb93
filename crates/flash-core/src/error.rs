//! Session error taxonomy

use thiserror::Error;

use crate::phase::Phase;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by the session orchestrator.
///
/// Every variant except `ResetLine` is fatal for the current attempt:
/// it moves the session to `Failed` (or leaves it `Disconnected` when no
/// connection exists yet) and re-enables the retry control. `ResetLine`
/// errors are tolerated: the device has already received new firmware,
/// so a reset-line hiccup is recorded as a diagnostic only and the
/// session still completes.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Serial access unsupported or denied by the user
    #[error("Serial access denied: {0}")]
    Permission(String),

    /// Opening, validating, or using the serial connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Firmware image download failed; message carries the HTTP status
    /// text verbatim
    #[error("Firmware fetch failed: {0}")]
    Fetch(String),

    /// Handshake, write, or verification error reported by the flashing
    /// engine, surfaced verbatim
    #[error("Flashing engine error: {0}")]
    Protocol(String),

    /// Best-effort reset sequence hiccup; never fatal
    #[error("Reset line error: {0}")]
    ResetLine(String),

    /// A second attempt was requested while one is in flight
    #[error("Flash attempt already in progress (phase: {0})")]
    Busy(Phase),

    /// Flash requested without an open connection
    #[error("No serial connection")]
    NotConnected,

    /// Internal guard: the requested phase transition is not in the graph
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },
}

impl SessionError {
    /// Whether this error terminates the attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ResetLine(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_line_is_non_fatal() {
        assert!(!SessionError::ResetLine("RTS stuck".into()).is_fatal());
        assert!(SessionError::Protocol("sync timeout".into()).is_fatal());
        assert!(SessionError::Fetch("Not Found".into()).is_fatal());
        assert!(SessionError::Busy(Phase::Flashing).is_fatal());
    }

    #[test]
    fn test_fetch_message_is_verbatim() {
        let err = SessionError::Fetch("Fetch failed (404): Not Found".into());
        assert!(err.to_string().contains("Not Found"));
    }
}
