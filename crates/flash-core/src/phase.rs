//! Session phase state machine

use serde::{Deserialize, Serialize};

/// Phase of the flashing session.
///
/// # Lifecycle
///
/// ```text
/// Disconnected → Connected → Fetching → Handshaking → Flashing → Resetting → Completed
///                    ▲           │           │            │                      │
///                    │           └───────────┴─────┬──────┘                      │
///                    │                             ▼                            │
///                    │                          Failed ──(retry)──► Fetching    │
///                    │                                                          │
///                    └────────────────────────(connect again)───────────────────┘
/// ```
///
/// Any phase may drop back to `Disconnected` on an explicit disconnect.
/// `Resetting` never fails: reset-line errors are tolerated and the session
/// still reaches `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No serial connection; initial state
    Disconnected,
    /// Serial port open, ready to flash
    Connected,
    /// Downloading the firmware image
    Fetching,
    /// Bootloader handshake / chip detection
    Handshaking,
    /// Writing the image to flash
    Flashing,
    /// Toggling control lines to restart into the new firmware
    Resetting,
    /// Flash attempt finished; connection released
    Completed,
    /// Attempt failed; retry available
    Failed,
}

impl Phase {
    /// Whether a flash attempt is currently in flight.
    ///
    /// While active, a second flash request must be rejected.
    pub fn is_attempt_active(&self) -> bool {
        matches!(
            self,
            Self::Fetching | Self::Handshaking | Self::Flashing | Self::Resetting
        )
    }

    /// Whether the session is in a terminal state for the current attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a connect request is accepted in this phase.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Completed)
    }

    /// Whether a flash (or retry) request is accepted in this phase.
    pub fn can_flash(&self) -> bool {
        matches!(self, Self::Connected | Self::Failed)
    }

    /// Whether the transition graph permits moving to `next`.
    ///
    /// Forward progression only; `Failed` is reachable from the three
    /// fallible attempt phases, and `Disconnected` from anywhere.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (*self, next),
            (Disconnected, Connected)
                | (Connected, Fetching)
                | (Fetching, Handshaking)
                | (Handshaking, Flashing)
                | (Flashing, Resetting)
                | (Resetting, Completed)
                | (Completed, Connected)
                | (Failed, Fetching)
                | (Fetching | Handshaking | Flashing, Failed)
                | (_, Disconnected)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Fetching => "fetching",
            Self::Handshaking => "handshaking",
            Self::Flashing => "flashing",
            Self::Resetting => "resetting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let path = [
            Phase::Disconnected,
            Phase::Connected,
            Phase::Fetching,
            Phase::Handshaking,
            Phase::Flashing,
            Phase::Resetting,
            Phase::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
        // Completed starts a fresh session via connect
        assert!(Phase::Completed.can_transition_to(Phase::Connected));
    }

    #[test]
    fn test_no_skipped_steps() {
        // Flashing cannot be entered without a successful handshake
        assert!(!Phase::Connected.can_transition_to(Phase::Flashing));
        assert!(!Phase::Fetching.can_transition_to(Phase::Flashing));
        // Fetching cannot be entered without a connection
        assert!(!Phase::Disconnected.can_transition_to(Phase::Fetching));
        // No backwards movement within an attempt
        assert!(!Phase::Flashing.can_transition_to(Phase::Fetching));
    }

    #[test]
    fn test_failure_edges() {
        assert!(Phase::Fetching.can_transition_to(Phase::Failed));
        assert!(Phase::Handshaking.can_transition_to(Phase::Failed));
        assert!(Phase::Flashing.can_transition_to(Phase::Failed));
        // Reset-line errors are tolerated, so Resetting never fails
        assert!(!Phase::Resetting.can_transition_to(Phase::Failed));
        // Retry restarts from Fetching, not Handshaking
        assert!(Phase::Failed.can_transition_to(Phase::Fetching));
        assert!(!Phase::Failed.can_transition_to(Phase::Handshaking));
    }

    #[test]
    fn test_explicit_disconnect_from_anywhere() {
        for phase in [
            Phase::Connected,
            Phase::Fetching,
            Phase::Flashing,
            Phase::Completed,
            Phase::Failed,
        ] {
            assert!(phase.can_transition_to(Phase::Disconnected));
        }
    }

    #[test]
    fn test_action_gating() {
        assert!(Phase::Disconnected.can_connect());
        assert!(Phase::Completed.can_connect());
        assert!(!Phase::Connected.can_connect());

        assert!(Phase::Connected.can_flash());
        assert!(Phase::Failed.can_flash());
        for phase in [
            Phase::Fetching,
            Phase::Handshaking,
            Phase::Flashing,
            Phase::Resetting,
        ] {
            assert!(phase.is_attempt_active());
            assert!(!phase.can_flash());
        }
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Phase::Handshaking).unwrap();
        assert_eq!(json, "\"handshaking\"");
        let parsed: Phase = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, Phase::Failed);
    }
}
