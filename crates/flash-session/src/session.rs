//! The flashing session orchestrator

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use flash_core::{
    AttemptLog, ControlState, FlashLabel, FlashProgress, LogEntry, LogSeverity, Phase,
    ProgressTracker, SessionError, SessionEvent, SessionResult,
};
use flash_engine::{EngineFactory, ImageEntry, TerminalSink, WriteEvent};
use flash_fetch::FirmwareSource;
use flash_transport::{ControlLine, SerialPort, SerialProvider, TransportError};

use crate::config::SessionConfig;

/// Mutable session state, guarded as a unit
struct SessionInner {
    phase: Phase,
    /// Claimed while a connect is awaiting the provider, so a concurrent
    /// connect cannot be granted a second port
    connect_pending: bool,
    connection: Option<Arc<dyn SerialPort>>,
    progress: ProgressTracker,
    log: AttemptLog,
    /// Tolerated (reset-line) errors, kept out of the attempt log
    diagnostics: Vec<String>,
    controls: ControlState,
}

/// The single active flashing session.
///
/// Owns at most one serial connection, sequences the
/// connect → fetch → handshake → flash → reset flow, and publishes state
/// transitions, progress, and log entries as [`SessionEvent`]s.
///
/// Exactly one flash attempt may be in flight; a second request while
/// one is active is rejected with [`SessionError::Busy`]. All engine and
/// fetch errors are caught at this boundary: they move the session to
/// `Failed`, re-enable the retry control, and never propagate as panics.
pub struct FlashSession {
    provider: Arc<dyn SerialProvider>,
    engines: Arc<dyn EngineFactory>,
    source: Arc<dyn FirmwareSource>,
    config: SessionConfig,
    inner: Arc<RwLock<SessionInner>>,
    events: broadcast::Sender<SessionEvent>,
}

impl FlashSession {
    pub fn new(
        provider: Arc<dyn SerialProvider>,
        engines: Arc<dyn EngineFactory>,
        source: Arc<dyn FirmwareSource>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            provider,
            engines,
            source,
            config,
            inner: Arc::new(RwLock::new(SessionInner {
                phase: Phase::Disconnected,
                connect_pending: false,
                connection: None,
                progress: ProgressTracker::new(),
                log: AttemptLog::new(),
                diagnostics: Vec::new(),
                controls: ControlState::default(),
            })),
            events,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.inner.read().phase
    }

    pub fn progress(&self) -> FlashProgress {
        self.inner.read().progress.current()
    }

    pub fn controls(&self) -> ControlState {
        self.inner.read().controls
    }

    /// Snapshot of the current attempt's log.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.inner.read().log.entries().to_vec()
    }

    /// Tolerated errors recorded outside the attempt log.
    pub fn diagnostics(&self) -> Vec<String> {
        self.inner.read().diagnostics.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().connection.is_some()
    }

    /// Request and open a serial connection.
    ///
    /// Accepted from `Disconnected` and `Completed` (a completed session
    /// released its connection, so this requests a fresh port). Denial or
    /// an open failure leaves the session where it was with no connection.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> SessionResult<()> {
        // Claim the connect slot under one lock so a concurrent request
        // cannot be granted a second port while this one is in flight.
        {
            let mut inner = self.inner.write();
            if !inner.phase.can_connect() || inner.connect_pending {
                return Err(SessionError::Busy(inner.phase));
            }
            inner.connect_pending = true;
        }

        let result = self.open_connection().await;
        self.inner.write().connect_pending = false;
        result
    }

    async fn open_connection(&self) -> SessionResult<()> {
        let port = match self.provider.request_port().await {
            Ok(port) => port,
            Err(err) => {
                self.log(LogSeverity::Error, format!("Connection error: {}", err));
                return Err(match err {
                    TransportError::PermissionDenied(msg) | TransportError::Unsupported(msg) => {
                        SessionError::Permission(msg)
                    }
                    other => SessionError::Transport(other.to_string()),
                });
            }
        };

        if let Err(err) = port.open(self.config.baud_rate).await {
            self.log(LogSeverity::Error, format!("Connection error: {}", err));
            return Err(SessionError::Transport(err.to_string()));
        }

        self.inner.write().connection = Some(port);
        self.set_phase(Phase::Connected)?;
        self.log(LogSeverity::Success, "Serial port open. Device ready.");
        self.set_controls(ControlState {
            connect_enabled: false,
            flash_enabled: true,
            flash_label: FlashLabel::Flash,
        });
        Ok(())
    }

    /// Run one flash attempt: fetch, handshake, write, reset.
    ///
    /// Accepted from `Connected` (first attempt) and `Failed` (retry,
    /// reusing the existing connection). The log and progress are cleared
    /// at the start of every attempt; a retry restarts from fetching, not
    /// from the byte offset of the previous attempt.
    #[instrument(skip(self))]
    pub async fn flash(&self) -> SessionResult<()> {
        // Guard and begin the attempt under one lock so a concurrent
        // request cannot slip in between the check and the transition.
        let port = {
            let mut inner = self.inner.write();
            if !inner.phase.can_flash() {
                return Err(SessionError::Busy(inner.phase));
            }
            let port = inner.connection.clone().ok_or(SessionError::NotConnected)?;
            inner.log.clear();
            inner.progress.reset();
            inner.diagnostics.clear();
            inner.phase = Phase::Fetching;
            port
        };
        let attempt_id = Uuid::new_v4();
        info!(%attempt_id, "flash attempt started");

        self.emit(SessionEvent::PhaseChanged {
            phase: Phase::Fetching,
        });
        self.emit(SessionEvent::Progress {
            progress: FlashProgress::default(),
        });
        self.set_controls(ControlState {
            connect_enabled: false,
            flash_enabled: false,
            flash_label: FlashLabel::Working,
        });

        match self.run_attempt(&port).await {
            Ok(()) => {
                info!(%attempt_id, "flash attempt completed");
                Ok(())
            }
            Err(err) => {
                warn!(%attempt_id, error = %err, "flash attempt failed");
                self.log(LogSeverity::Error, format!("Critical error: {}", err));
                self.set_phase(Phase::Failed)?;
                // Connection is preserved so retry can skip the permission
                // prompt and resume from fetching.
                self.set_controls(ControlState {
                    connect_enabled: false,
                    flash_enabled: true,
                    flash_label: FlashLabel::Retry,
                });
                Err(err)
            }
        }
    }

    /// Explicitly release the connection and return to `Disconnected`.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> SessionResult<()> {
        let port = self.inner.write().connection.take();
        if let Some(port) = port {
            if let Err(err) = port.close().await {
                warn!(error = %err, "close failed during disconnect");
            }
        }
        self.set_phase(Phase::Disconnected)?;
        self.set_controls(ControlState::default());
        Ok(())
    }

    async fn run_attempt(&self, port: &Arc<dyn SerialPort>) -> SessionResult<()> {
        // Fetching
        self.log(
            LogSeverity::Info,
            format!("Fetching firmware image: {}", self.source.describe()),
        );
        let image = self
            .source
            .fetch()
            .await
            .map_err(|e| SessionError::Fetch(e.to_string()))?;
        self.log(
            LogSeverity::Info,
            format!("Image loaded ({} bytes). Preparing to flash.", image.len()),
        );
        self.set_phase(Phase::Handshaking)?;

        // A retry may find the port dead underneath the preserved handle.
        if !port.is_open().await {
            return Err(SessionError::Transport(
                "serial connection is no longer open".to_string(),
            ));
        }

        let terminal: Arc<dyn TerminalSink> = Arc::new(SessionTerminal {
            inner: self.inner.clone(),
            events: self.events.clone(),
        });
        let mut engine = self
            .engines
            .create(port.clone(), self.config.baud_rate, terminal);

        self.log(LogSeverity::Info, "Connecting to bootloader...");
        let chip = engine
            .detect_chip()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        self.log(
            LogSeverity::Success,
            format!("Chip detected: {}", chip.description),
        );
        self.set_phase(Phase::Flashing)?;

        let entries = [ImageEntry {
            data: image.data().clone(),
            address: image.load_address(),
        }];
        let mut on_event = |event: WriteEvent| match event {
            WriteEvent::Progress { written, total } => self.apply_progress(written, total),
            WriteEvent::VerifyDigest(digest) => {
                self.log(LogSeverity::Info, format!("Verification hash: {}", digest));
            }
        };
        engine
            .write_image(&entries, &self.config.write_options, &mut on_event)
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        // Resetting: best-effort, never fails the attempt.
        self.set_phase(Phase::Resetting)?;
        self.log(LogSeverity::Info, "Resetting device...");
        self.hard_reset(port).await;

        // The device now runs the new firmware; release the connection.
        self.inner.write().connection = None;

        let update = self.inner.write().progress.complete();
        self.emit(SessionEvent::Progress {
            progress: update.progress,
        });

        self.set_phase(Phase::Completed)?;
        self.log(LogSeverity::Success, "Firmware update completed.");
        self.set_controls(ControlState {
            connect_enabled: true,
            flash_enabled: false,
            flash_label: FlashLabel::Done,
        });
        Ok(())
    }

    /// Deassert/assert/deassert the control lines, then close the port.
    ///
    /// Any error here is tolerated: the firmware is already written, so a
    /// reset-line hiccup is recorded as a diagnostic, not a failure.
    async fn hard_reset(&self, port: &Arc<dyn SerialPort>) {
        if let Err(err) = self.reset_sequence(port).await {
            let err = SessionError::ResetLine(err.to_string());
            warn!(error = %err, "reset sequence failed (tolerated)");
            self.inner.write().diagnostics.push(err.to_string());
        }
    }

    async fn reset_sequence(&self, port: &Arc<dyn SerialPort>) -> Result<(), TransportError> {
        port.set_control_line(ControlLine::Dtr, false).await?;
        port.set_control_line(ControlLine::Rts, true).await?;
        tokio::time::sleep(Duration::from_millis(self.config.reset_settle_ms)).await;
        port.set_control_line(ControlLine::Rts, false).await?;
        port.close().await?;
        Ok(())
    }

    fn apply_progress(&self, written: u64, total: u64) {
        let update = self.inner.write().progress.update(written, total);
        self.emit(SessionEvent::Progress {
            progress: update.progress,
        });
        if let Some(pct) = update.milestone {
            self.log(LogSeverity::Info, format!("Flashing: {}%", pct));
        }
    }

    fn set_phase(&self, to: Phase) -> SessionResult<()> {
        let mut inner = self.inner.write();
        let from = inner.phase;
        if !from.can_transition_to(to) {
            return Err(SessionError::InvalidTransition { from, to });
        }
        debug!(%from, %to, "phase transition");
        inner.phase = to;
        drop(inner);
        self.emit(SessionEvent::PhaseChanged { phase: to });
        Ok(())
    }

    fn set_controls(&self, controls: ControlState) {
        self.inner.write().controls = controls;
        self.emit(SessionEvent::Controls { controls });
    }

    fn log(&self, severity: LogSeverity, message: impl Into<String>) {
        let entry = self.inner.write().log.push(severity, message);
        self.emit(SessionEvent::Log { entry });
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

/// Bridges engine terminal output into the attempt log
struct SessionTerminal {
    inner: Arc<RwLock<SessionInner>>,
    events: broadcast::Sender<SessionEvent>,
}

impl TerminalSink for SessionTerminal {
    fn clean(&self) {
        // The session clears the log at attempt start; the engine does
        // not get to wipe it mid-attempt.
    }

    fn write_line(&self, line: &str) {
        let entry = self.inner.write().log.push(LogSeverity::Info, line);
        let _ = self.events.send(SessionEvent::Log { entry });
    }

    fn write(&self, text: &str) {
        tracing::trace!(target: "engine_terminal", "{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use flash_engine::{ScriptedEngineFactory, WriteOptions};
    use flash_fetch::InMemorySource;
    use flash_transport::mock::MockSerialProvider;
    use flash_transport::MockConfig;

    fn session_with(provider: Arc<MockSerialProvider>) -> FlashSession {
        FlashSession::new(
            provider,
            Arc::new(ScriptedEngineFactory::default()),
            Arc::new(InMemorySource::new(Bytes::from(vec![0xE9; 1024]))),
            SessionConfig {
                reset_settle_ms: 0,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_initial_state() {
        let session = session_with(Arc::new(MockSerialProvider::new(&MockConfig::default())));
        assert_eq!(session.phase(), Phase::Disconnected);
        assert!(!session.is_connected());
        assert_eq!(session.controls(), ControlState::default());
        assert!(session.log_entries().is_empty());
    }

    #[tokio::test]
    async fn test_connect_denied_stays_disconnected() {
        let provider = Arc::new(MockSerialProvider::new(&MockConfig::default()));
        provider.deny_request(true);
        let session = session_with(provider);

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Permission(_)));
        assert_eq!(session.phase(), Phase::Disconnected);
        assert!(!session.is_connected());
        // Connect stays available; no retry state is needed
        assert!(session.controls().connect_enabled);
    }

    #[tokio::test]
    async fn test_connect_opens_at_fixed_baud() {
        let provider = Arc::new(MockSerialProvider::new(&MockConfig::default()));
        let session = session_with(provider.clone());

        session.connect().await.unwrap();
        assert_eq!(session.phase(), Phase::Connected);
        assert_eq!(provider.last_port().unwrap().baud_rate(), 115_200);
        assert!(session.controls().flash_enabled);
        assert!(!session.controls().connect_enabled);
    }

    #[tokio::test]
    async fn test_flash_without_connection_rejected() {
        let session = session_with(Arc::new(MockSerialProvider::new(&MockConfig::default())));
        let err = session.flash().await.unwrap_err();
        assert!(matches!(err, SessionError::Busy(Phase::Disconnected)));
    }

    #[tokio::test]
    async fn test_connect_twice_rejected() {
        let provider = Arc::new(MockSerialProvider::new(&MockConfig::default()));
        let session = session_with(provider);
        session.connect().await.unwrap();
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Busy(Phase::Connected)));
    }

    #[tokio::test]
    async fn test_verify_disabled_emits_no_digest_line() {
        let provider = Arc::new(MockSerialProvider::new(&MockConfig::default()));
        let session = FlashSession::new(
            provider,
            Arc::new(ScriptedEngineFactory::default()),
            Arc::new(InMemorySource::new(Bytes::from(vec![0xE9; 64]))),
            SessionConfig {
                reset_settle_ms: 0,
                write_options: WriteOptions {
                    verify: false,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        session.connect().await.unwrap();
        session.flash().await.unwrap();
        assert!(!session
            .log_entries()
            .iter()
            .any(|e| e.message.contains("Verification hash")));
    }
}
