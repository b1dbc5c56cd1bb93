//! Flash progress tracking with 20%-milestone log filtering

use serde::{Deserialize, Serialize};

/// Percentage step at which a progress log line is emitted.
///
/// The progress bar is updated on every callback; log lines are only
/// emitted at exact multiples of this step to bound log volume.
pub const MILESTONE_STEP: u8 = 20;

/// Byte-level progress of the current flash operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashProgress {
    /// Bytes written so far (never reported greater than `bytes_total`)
    pub bytes_written: u64,
    /// Total bytes in the current write
    pub bytes_total: u64,
}

impl FlashProgress {
    /// Progress percentage in `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        (self.bytes_written as f64 / self.bytes_total as f64) * 100.0
    }
}

/// Result of feeding one progress callback into the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Clamped, monotone progress to display
    pub progress: FlashProgress,
    /// Floored percentage that crossed a milestone, if this callback was
    /// the first to reach it within the attempt
    pub milestone: Option<u8>,
}

/// Tracks write progress across one flash attempt.
///
/// Enforces the reporting contract: displayed progress is monotone
/// non-decreasing, `bytes_written` never exceeds `bytes_total`, and each
/// 20%-multiple triggers at most one milestone per attempt even if the
/// engine fires several callbacks at the same percentage.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    current: FlashProgress,
    emitted: [bool; (100 / MILESTONE_STEP as usize) + 1],
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress snapshot.
    pub fn current(&self) -> FlashProgress {
        self.current
    }

    /// Zero out progress and milestone state at the start of a new attempt.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one `(written, total)` callback from the engine.
    pub fn update(&mut self, written: u64, total: u64) -> ProgressUpdate {
        // Clamp to the contract: never above total, never backwards.
        let written = written.min(total).max(self.current.bytes_written);
        self.current = FlashProgress {
            bytes_written: written,
            bytes_total: total,
        };

        let floored = self.current.percent().floor() as u64;
        let milestone = if floored % MILESTONE_STEP as u64 == 0 {
            let slot = (floored / MILESTONE_STEP as u64) as usize;
            if slot < self.emitted.len() && !self.emitted[slot] {
                self.emitted[slot] = true;
                Some(floored as u8)
            } else {
                None
            }
        } else {
            None
        };

        ProgressUpdate {
            progress: self.current,
            milestone,
        }
    }

    /// Snap progress to 100% once the write has completed.
    pub fn complete(&mut self) -> ProgressUpdate {
        let total = self.current.bytes_total;
        self.update(total, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percent_monotone_and_clamped() {
        let mut tracker = ProgressTracker::new();
        let mut last = 0.0;
        // Engine callbacks include a bogus over-total and a repeated value
        for written in [0u64, 100, 250, 250, 400, 900, 1200] {
            let update = tracker.update(written, 1000);
            let pct = update.progress.percent();
            assert!(pct >= last, "percentage went backwards: {} < {}", pct, last);
            assert!(pct <= 100.0);
            assert!(update.progress.bytes_written <= update.progress.bytes_total);
            last = pct;
        }
        assert_eq!(tracker.current().bytes_written, 1000);
    }

    #[test]
    fn test_milestones_at_multiples_of_twenty() {
        let mut tracker = ProgressTracker::new();
        let mut milestones = Vec::new();
        for written in [0u64, 50, 200, 350, 400, 600, 650, 800, 1000] {
            if let Some(m) = tracker.update(written, 1000).milestone {
                milestones.push(m);
            }
        }
        assert_eq!(milestones, vec![0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn test_no_duplicate_milestone_for_repeated_callback() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update(200, 1000).milestone, Some(20));
        // Same percentage fired twice; only the first crossing logs
        assert_eq!(tracker.update(200, 1000).milestone, None);
        assert_eq!(tracker.update(209, 1000).milestone, None);
    }

    #[test]
    fn test_non_multiple_percentages_do_not_log() {
        let mut tracker = ProgressTracker::new();
        tracker.update(0, 1000);
        for written in [10u64, 150, 330, 990] {
            assert_eq!(tracker.update(written, 1000).milestone, None);
        }
    }

    #[test]
    fn test_reset_clears_milestones_and_progress() {
        let mut tracker = ProgressTracker::new();
        tracker.update(1000, 1000);
        tracker.reset();
        assert_eq!(tracker.current(), FlashProgress::default());
        // Milestones re-arm for the new attempt
        assert_eq!(tracker.update(0, 500).milestone, Some(0));
    }

    #[test]
    fn test_complete_snaps_to_full() {
        let mut tracker = ProgressTracker::new();
        tracker.update(700, 1000);
        let update = tracker.complete();
        assert_eq!(update.progress.bytes_written, 1000);
        assert_eq!(update.milestone, Some(100));
        assert_eq!(update.progress.percent(), 100.0);
    }

    #[test]
    fn test_zero_total_reports_zero_percent() {
        let progress = FlashProgress {
            bytes_written: 0,
            bytes_total: 0,
        };
        assert_eq!(progress.percent(), 0.0);
    }
}
