//! Interval progress logging for pipeline stages.
//!
//! A stage owns a [`ProgressTracker`], calls [`ProgressTracker::record`] as
//! items pass through, and [`ProgressTracker::finish`] when its input drains.
//! The tracker is `Sync`, so a stage may also share it with a helper thread.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of items between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Logs "<label> <n>" every time the running count crosses a multiple of the interval.
///
/// # Example
/// ```
/// use seqpipe_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("reader: read lines").with_interval(100);
/// for _ in 0..250 {
///     tracker.record(1); // logs at 100 and 200
/// }
/// tracker.finish(); // logs "reader: read lines 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
#[derive(Debug)]
pub struct ProgressTracker {
    label: String,
    interval: u64,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker with the default interval.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), interval: DEFAULT_PROGRESS_INTERVAL, count: AtomicU64::new(0) }
    }

    /// Set the interval between messages; zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Add `items` to the count, logging once per interval boundary crossed.
    ///
    /// Returns `true` if the new count sits exactly on a boundary.
    pub fn record(&self, items: u64) -> bool {
        let before = self.count.fetch_add(items, Ordering::Relaxed);
        let after = before + items;

        for boundary in (before / self.interval + 1)..=(after / self.interval) {
            info!("{} {}", self.label, boundary * self.interval);
        }
        after > 0 && after.is_multiple_of(self.interval)
    }

    /// Log the final count unless the last boundary message already showed it.
    pub fn finish(&self) {
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.label, count);
        }
    }

    /// Items recorded so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
