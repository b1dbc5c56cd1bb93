//! Append-only session log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a session log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    /// Neutral progress information
    Info,
    /// A step finished successfully
    Success,
    /// A step failed
    Error,
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One entry in the session log panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
    /// Entry severity
    pub severity: LogSeverity,
    /// Human-readable message
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
        }
    }
}

/// Ordered, append-only log for one flash attempt.
///
/// Entries are only ever appended for the lifetime of an attempt; the
/// buffer is cleared as a whole when the next attempt starts.
#[derive(Debug, Default)]
pub struct AttemptLog {
    entries: Vec<LogEntry>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning a clone for event fan-out.
    pub fn push(&mut self, severity: LogSeverity, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry::new(severity, message);
        self.entries.push(entry.clone());
        entry
    }

    /// Drop all entries at the start of a new attempt.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order_preserved() {
        let mut log = AttemptLog::new();
        log.push(LogSeverity::Info, "first");
        log.push(LogSeverity::Success, "second");
        log.push(LogSeverity::Error, "third");

        let messages: Vec<_> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_clear_for_next_attempt() {
        let mut log = AttemptLog::new();
        log.push(LogSeverity::Error, "stale failure");
        log.clear();
        assert!(log.is_empty());
        assert!(!log.contains("stale failure"));
    }

    #[test]
    fn test_contains() {
        let mut log = AttemptLog::new();
        log.push(LogSeverity::Error, "Fetch failed (404): Not Found");
        assert!(log.contains("Not Found"));
        assert!(!log.contains("Forbidden"));
    }
}
