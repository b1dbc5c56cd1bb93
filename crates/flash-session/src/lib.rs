//! flash-session - Session orchestrator for firmware flashing
//!
//! Composes the serial transport, the firmware image source, and the
//! flashing engine into the user-facing flow:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FlashSession                           │
//! │  Owns the connection and the phase machine                  │
//! │                                                             │
//! │  connect ─► Connected                                       │
//! │  flash   ─► Fetching ─► Handshaking ─► Flashing ─► Resetting│
//! │                  │            │            │          │     │
//! │                  └────────────┴── Failed ◄─┘     (tolerated)│
//! │                                     │                 │     │
//! │                                  (retry)          Completed │
//! │                                                             │
//! │   ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐   │
//! │   │SerialProvider│  │FirmwareSource│  │  EngineFactory  │   │
//! │   │ (transport)  │  │   (fetch)    │  │ (chip protocol) │   │
//! │   └──────────────┘  └──────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phase changes, progress, log entries, and control state are published
//! on a broadcast channel in callback order.

pub mod config;
pub mod session;

pub use config::SessionConfig;
pub use session::FlashSession;

// Re-export for convenience
pub use flash_core::{
    ControlState, FlashLabel, FlashProgress, LogEntry, LogSeverity, Phase, SessionError,
    SessionEvent, SessionResult,
};
