//! Session events broadcast to the user-facing surface

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::phase::Phase;
use crate::progress::FlashProgress;

/// Label to render on the flash action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLabel {
    /// Initial state: "Flash"
    Flash,
    /// Attempt in flight: "Working..."
    Working,
    /// Previous attempt failed: "Retry"
    Retry,
    /// Attempt finished: "Done"
    Done,
}

impl std::fmt::Display for FlashLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flash => write!(f, "Flash"),
            Self::Working => write!(f, "Working..."),
            Self::Retry => write!(f, "Retry"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Enable/disable state of the two user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Whether the connect action is accepted
    pub connect_enabled: bool,
    /// Whether the flash/retry action is accepted
    pub flash_enabled: bool,
    /// Label for the flash action
    pub flash_label: FlashLabel,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            connect_enabled: true,
            flash_enabled: false,
            flash_label: FlashLabel::Flash,
        }
    }
}

/// Events published by the session, in callback order.
///
/// The broadcast channel fans these out to whatever surface is attached
/// (CLI renderer, test collector). Progress events fire on every engine
/// callback; log entries follow the milestone filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved to a new phase
    PhaseChanged { phase: Phase },
    /// Progress bar update
    Progress { progress: FlashProgress },
    /// A log entry was appended
    Log { entry: LogEntry },
    /// Action enable/disable state changed
    Controls { controls: ControlState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::PhaseChanged {
            phase: Phase::Flashing,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["phase"], "flashing");
    }

    #[test]
    fn test_default_controls() {
        let controls = ControlState::default();
        assert!(controls.connect_enabled);
        assert!(!controls.flash_enabled);
        assert_eq!(controls.flash_label, FlashLabel::Flash);
    }
}
