//! Session configuration
//!
//! The defaults are the fixed constants of the flow; nothing here is
//! loaded from the environment.

use serde::{Deserialize, Serialize};

use flash_core::DEFAULT_BAUD_RATE;
use flash_engine::WriteOptions;

/// Configuration for a flashing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Baud rate for both the connection and the engine
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Settle delay between control-line toggles during hard reset
    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,
    /// Capacity of the session event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Engine write options
    #[serde(default)]
    pub write_options: WriteOptions,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_reset_settle_ms() -> u64 {
    100
}

fn default_event_capacity() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            reset_settle_ms: default_reset_settle_ms(),
            event_capacity: default_event_capacity(),
            write_options: WriteOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.reset_settle_ms, 100);
        assert!(config.write_options.verify);
    }

    #[test]
    fn test_empty_json_yields_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.baud_rate, 115_200);
    }
}
