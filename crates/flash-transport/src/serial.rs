//! System serial port adapter over the `serialport` crate

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::port::{ControlLine, SerialPort, SerialProvider};
use super::TransportError;

/// Read/write timeout for the underlying port.
const IO_TIMEOUT: Duration = Duration::from_secs(3);

/// A system serial port addressed by device path.
///
/// The handle is created unopened; `open` performs the actual OS open at
/// the requested baud rate. Calls are short blocking operations on the
/// underlying driver, serialized by the inner mutex.
pub struct SystemSerialPort {
    path: String,
    inner: Mutex<Option<Box<dyn serialport::SerialPort>>>,
}

impl SystemSerialPort {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl SerialPort for SystemSerialPort {
    async fn open(&self, baud_rate: u32) -> Result<(), TransportError> {
        let port = serialport::new(&self.path, baud_rate)
            .timeout(IO_TIMEOUT)
            .open()
            .map_err(|e| TransportError::OpenFailed(format!("{}: {}", self.path, e)))?;
        info!(path = %self.path, baud_rate, "serial port open");
        *self.inner.lock() = Some(port);
        Ok(())
    }

    async fn set_control_line(&self, line: ControlLine, high: bool) -> Result<(), TransportError> {
        let mut guard = self.inner.lock();
        let port = guard.as_mut().ok_or(TransportError::NotOpen)?;
        debug!(%line, high, "setting control line");
        let result = match line {
            ControlLine::Dtr => port.write_data_terminal_ready(high),
            ControlLine::Rts => port.write_request_to_send(high),
        };
        result.map_err(|e| TransportError::ControlLine {
            line: line.to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.inner.lock();
        let port = guard.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(data)?;
        Ok(())
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut guard = self.inner.lock();
        let port = guard.as_mut().ok_or(TransportError::NotOpen)?;
        Ok(port.read(buf)?)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut guard = self.inner.lock();
        if guard.take().is_none() {
            return Err(TransportError::NotOpen);
        }
        info!(path = %self.path, "serial port closed");
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }
}

/// Provider for a fixed device path.
///
/// There is no permission prompt on the host; a missing or inaccessible
/// device surfaces when the session opens the port.
pub struct SystemSerialProvider {
    path: String,
}

impl SystemSerialProvider {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SerialProvider for SystemSerialProvider {
    async fn request_port(&self) -> Result<Arc<dyn SerialPort>, TransportError> {
        Ok(Arc::new(SystemSerialPort::new(self.path.clone())))
    }
}
