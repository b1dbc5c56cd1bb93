//! Serial transport errors

use thiserror::Error;

/// Errors from the serial transport layer
#[derive(Debug, Error)]
pub enum TransportError {
    /// Serial capability not available on this host/build
    #[error("Serial transport unsupported: {0}")]
    Unsupported(String),

    /// The user denied or cancelled the port request
    #[error("Port request denied: {0}")]
    PermissionDenied(String),

    /// Opening the port at the requested baud rate failed
    #[error("Failed to open port: {0}")]
    OpenFailed(String),

    /// Operation attempted on a port that is not open
    #[error("Serial port is not open")]
    NotOpen,

    /// Setting a control line failed
    #[error("Control line {line} failed: {message}")]
    ControlLine { line: String, message: String },

    /// Read/write/close error on the open port
    #[error("Serial I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
