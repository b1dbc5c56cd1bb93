//! flash-transport - Serial transport seam for the flashing session
//!
//! This crate abstracts the serial capability the orchestrator consumes:
//! request a port, open it at a baud rate, toggle control lines during the
//! hard-reset sequence, and close it. Adapters:
//! - System serial ports via the `serialport` crate (default feature)
//! - Mock adapter for deterministic tests
//!
//! # Example
//!
//! ```ignore
//! use flash_transport::{create_provider, TransportConfig};
//!
//! let config = TransportConfig::Mock(Default::default());
//! let provider = create_provider(&config)?;
//! let port = provider.request_port().await?;
//! port.open(115_200).await?;
//! ```

pub mod error;
pub mod mock;
pub mod port;

#[cfg(feature = "serialport")]
pub mod serial;

pub use error::TransportError;
pub use port::{ControlLine, SerialPort, SerialProvider};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// System serial port at a device path (e.g. "/dev/ttyUSB0")
    Serial(SerialConfig),
    /// Mock transport for testing
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// System serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path of the port to request
    pub path: String,
}

/// Mock transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated per-operation latency
    #[serde(default)]
    pub latency_ms: u64,
    /// Simulate the user cancelling the port request
    #[serde(default)]
    pub deny_request: bool,
}

/// Create a serial provider based on configuration
pub fn create_provider(
    config: &TransportConfig,
) -> Result<Arc<dyn SerialProvider>, TransportError> {
    match config {
        #[cfg(feature = "serialport")]
        TransportConfig::Serial(cfg) => Ok(Arc::new(serial::SystemSerialProvider::new(&cfg.path))),
        #[cfg(not(feature = "serialport"))]
        TransportConfig::Serial(_) => Err(TransportError::Unsupported(
            "System serial ports require the 'serialport' feature".to_string(),
        )),
        TransportConfig::Mock(cfg) => Ok(Arc::new(mock::MockSerialProvider::new(cfg))),
    }
}
