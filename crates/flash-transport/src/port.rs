//! Serial port and provider traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::TransportError;

/// Serial control lines used by the hard-reset sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlLine {
    /// Data Terminal Ready
    Dtr,
    /// Request To Send
    Rts,
}

impl std::fmt::Display for ControlLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dtr => write!(f, "DTR"),
            Self::Rts => write!(f, "RTS"),
        }
    }
}

/// A bidirectional serial connection with line control.
///
/// Exactly one of these is owned by the session at a time. The flashing
/// engine operates through the handle while it is live; only the session
/// opens or closes it.
#[async_trait]
pub trait SerialPort: Send + Sync {
    /// Open the connection at the given baud rate.
    async fn open(&self, baud_rate: u32) -> Result<(), TransportError>;

    /// Set a control line high or low. Best-effort during reset.
    async fn set_control_line(&self, line: ControlLine, high: bool) -> Result<(), TransportError>;

    /// Write raw bytes to the port.
    async fn write_all(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Read available bytes into `buf`, returning the count.
    async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Close the connection. Best-effort during reset.
    async fn close(&self) -> Result<(), TransportError>;

    /// Whether the connection is currently open and usable.
    async fn is_open(&self) -> bool;
}

/// The serial capability: requesting access to a port.
///
/// Requesting may involve a user gesture/permission; denial is reported
/// as [`TransportError::PermissionDenied`].
#[async_trait]
pub trait SerialProvider: Send + Sync {
    /// Request access to a serial port, unopened.
    async fn request_port(&self) -> Result<Arc<dyn SerialPort>, TransportError>;
}
