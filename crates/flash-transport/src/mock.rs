//! Mock serial transport for testing

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::port::{ControlLine, SerialPort, SerialProvider};
use super::{MockConfig, TransportError};

/// Operation recorded by the mock port, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortOp {
    Open(u32),
    SetLine(ControlLine, bool),
    Write(usize),
    Close,
}

/// Mock serial port recording every operation.
///
/// Failure injection mirrors the scenarios the session must tolerate:
/// control-line errors during reset, close errors, and a port that dies
/// between attempts.
pub struct MockSerialPort {
    config: MockConfig,
    open: AtomicBool,
    baud_rate: AtomicU32,
    fail_control_lines: AtomicBool,
    fail_close: AtomicBool,
    fail_open: AtomicBool,
    ops: RwLock<Vec<PortOp>>,
    written: RwLock<Vec<u8>>,
}

impl MockSerialPort {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            config: config.clone(),
            open: AtomicBool::new(false),
            baud_rate: AtomicU32::new(0),
            fail_control_lines: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            ops: RwLock::new(Vec::new()),
            written: RwLock::new(Vec::new()),
        }
    }

    /// Make every subsequent `set_control_line` call fail.
    pub fn fail_control_lines(&self, fail: bool) {
        self.fail_control_lines.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `close` call fail.
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `open` call fail.
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Simulate the port dying underneath the session (e.g. unplugged).
    pub fn kill(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Baud rate the port was last opened at.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.load(Ordering::SeqCst)
    }

    /// Recorded operations, in call order.
    pub fn ops(&self) -> Vec<PortOp> {
        self.ops.read().clone()
    }

    /// Bytes written through the port.
    pub fn written(&self) -> Vec<u8> {
        self.written.read().clone()
    }

    async fn latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

#[async_trait]
impl SerialPort for MockSerialPort {
    async fn open(&self, baud_rate: u32) -> Result<(), TransportError> {
        self.latency().await;
        self.ops.write().push(PortOp::Open(baud_rate));
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::OpenFailed("mock open failure".to_string()));
        }
        self.baud_rate.store(baud_rate, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn set_control_line(&self, line: ControlLine, high: bool) -> Result<(), TransportError> {
        self.latency().await;
        self.ops.write().push(PortOp::SetLine(line, high));
        if self.fail_control_lines.load(Ordering::SeqCst) {
            return Err(TransportError::ControlLine {
                line: line.to_string(),
                message: "mock control line failure".to_string(),
            });
        }
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::NotOpen);
        }
        Ok(())
    }

    async fn write_all(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::NotOpen);
        }
        self.latency().await;
        self.ops.write().push(PortOp::Write(data.len()));
        self.written.write().extend_from_slice(data);
        Ok(())
    }

    async fn read(&self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::NotOpen);
        }
        self.latency().await;
        Ok(0)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.latency().await;
        self.ops.write().push(PortOp::Close);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::Io("mock close failure".to_string()));
        }
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Mock serial provider handing out [`MockSerialPort`]s.
///
/// Tracks how many ports were requested so tests can assert that a
/// completed session requires a fresh request before reconnecting.
pub struct MockSerialProvider {
    config: MockConfig,
    deny_request: AtomicBool,
    request_count: AtomicUsize,
    last_port: RwLock<Option<Arc<MockSerialPort>>>,
}

impl MockSerialProvider {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            config: config.clone(),
            deny_request: AtomicBool::new(config.deny_request),
            request_count: AtomicUsize::new(0),
            last_port: RwLock::new(None),
        }
    }

    /// Simulate the user cancelling the next port request.
    pub fn deny_request(&self, deny: bool) {
        self.deny_request.store(deny, Ordering::SeqCst);
    }

    /// How many port requests have been granted or denied.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// The most recently handed-out port, for failure injection.
    pub fn last_port(&self) -> Option<Arc<MockSerialPort>> {
        self.last_port.read().clone()
    }
}

#[async_trait]
impl SerialProvider for MockSerialProvider {
    async fn request_port(&self) -> Result<Arc<dyn SerialPort>, TransportError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if self.deny_request.load(Ordering::SeqCst) {
            return Err(TransportError::PermissionDenied(
                "user cancelled the port request".to_string(),
            ));
        }
        let port = Arc::new(MockSerialPort::new(&self.config));
        *self.last_port.write() = Some(port.clone());
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_records_baud_rate() {
        let port = MockSerialPort::new(&MockConfig::default());
        assert!(!port.is_open().await);
        port.open(115_200).await.unwrap();
        assert!(port.is_open().await);
        assert_eq!(port.baud_rate(), 115_200);
        assert_eq!(port.ops(), vec![PortOp::Open(115_200)]);
    }

    #[tokio::test]
    async fn test_control_line_failure_injection() {
        let port = MockSerialPort::new(&MockConfig::default());
        port.open(115_200).await.unwrap();
        port.fail_control_lines(true);

        let err = port
            .set_control_line(ControlLine::Rts, true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ControlLine { .. }));
        // Failed call is still recorded
        assert!(port.ops().contains(&PortOp::SetLine(ControlLine::Rts, true)));
    }

    #[tokio::test]
    async fn test_write_requires_open_port() {
        let port = MockSerialPort::new(&MockConfig::default());
        let err = port.write_all(&[0xAA]).await.unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));

        port.open(115_200).await.unwrap();
        port.write_all(&[0xAA, 0xBB]).await.unwrap();
        assert_eq!(port.written(), vec![0xAA, 0xBB]);
    }

    #[tokio::test]
    async fn test_provider_denial_and_count() {
        let provider = MockSerialProvider::new(&MockConfig::default());
        provider.deny_request(true);
        assert!(matches!(
            provider.request_port().await,
            Err(TransportError::PermissionDenied(_))
        ));

        provider.deny_request(false);
        let port = provider.request_port().await.unwrap();
        assert!(!port.is_open().await);
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let port = MockSerialPort::new(&MockConfig::default());
        port.open(115_200).await.unwrap();
        port.close().await.unwrap();
        assert!(!port.is_open().await);
        port.open(9600).await.unwrap();
        assert_eq!(port.baud_rate(), 9600);
    }
}
