//! Progress tracking utilities
//!
//! A thread-safe progress tracker that logs at regular intervals. When a total is known
//! the log line reads `<processed>/<remaining>`, otherwise just the processed count.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default logging interval: one progress line per million records.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Thread-safe progress tracker for logging progress at regular intervals.
///
/// # Example
/// ```
/// use fsort_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Wrote lines").with_interval(100).with_total(250);
///
/// for _ in 0..250 {
///     tracker.log_if_needed(1);  // Logs "Wrote lines 100/150", "Wrote lines 200/50"
/// }
/// tracker.log_final();  // Logs "Wrote lines 250/0 (complete)"
/// ```
pub struct ProgressTracker {
    /// Progress is logged when the count crosses multiples of this.
    interval: u64,
    /// Message prefix for log output.
    message: String,
    /// Expected number of items, if known.
    total: Option<u64>,
    /// Items processed so far.
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a new progress tracker with the specified message.
    ///
    /// The tracker starts with a count of 0 and an interval of
    /// [`DEFAULT_PROGRESS_INTERVAL`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            interval: DEFAULT_PROGRESS_INTERVAL,
            message: message.into(),
            total: None,
            count: AtomicU64::new(0),
        }
    }

    /// Set the logging interval. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Set the expected total so log lines include the remaining count.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    fn format_progress(&self, processed: u64) -> String {
        match self.total {
            Some(total) => {
                format!("{} {}/{}", self.message, processed, total.saturating_sub(processed))
            }
            None => format!("{} {}", self.message, processed),
        }
    }

    /// Add to the count and log once for every interval boundary crossed.
    ///
    /// Returns `true` if the new count is exactly a multiple of the interval.
    ///
    /// # Example
    /// ```
    /// use fsort_lib::progress::ProgressTracker;
    ///
    /// let tracker = ProgressTracker::new("Items").with_interval(100);
    /// assert!(!tracker.log_if_needed(50));   // count=50, no log
    /// assert!(!tracker.log_if_needed(60));   // count=110, logs "Items 100"
    /// assert!(tracker.log_if_needed(90));    // count=200, logs "Items 200"
    /// ```
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count.is_multiple_of(self.interval);
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;

        for i in (prev / self.interval + 1)..=(new_count / self.interval) {
            info!("{}", self.format_progress(i * self.interval));
        }

        new_count.is_multiple_of(self.interval)
    }

    /// Log final progress with "(complete)" unless the last interval log already covered it.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count.load(Ordering::Relaxed);
            if count > 0 {
                info!("{} (complete)", self.format_progress(count));
            }
        }
    }

    /// Get the current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
