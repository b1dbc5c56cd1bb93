//! flash-core - Core models and errors for the flashing session orchestrator
//!
//! This crate provides the shared vocabulary of the flashing flow: the
//! session phase machine, progress tracking with milestone logging, the
//! append-only attempt log, session events, and the error taxonomy.
//! The transport, engine, and image-source seams live in their own crates
//! and all speak these types.

pub mod error;
pub mod event;
pub mod image;
pub mod log;
pub mod phase;
pub mod progress;

pub use error::{SessionError, SessionResult};
pub use event::{ControlState, FlashLabel, SessionEvent};
pub use image::{FirmwareImage, FLASH_LOAD_ADDRESS};
pub use log::{AttemptLog, LogEntry, LogSeverity};
pub use phase::Phase;
pub use progress::{FlashProgress, ProgressTracker, ProgressUpdate, MILESTONE_STEP};

/// Baud rate used for both the initial connection and the flashing engine.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default relative path of the firmware image on the serving origin.
pub const DEFAULT_IMAGE_PATH: &str = "firmware.bin";
