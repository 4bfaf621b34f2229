//! Formatting and summary logging for pipeline runs.
//!
//! Everything here logs through the `log` facade; the binary installs
//! `env_logger`, library users pick their own backend.

use std::time::{Duration, Instant};

use crate::metrics::LengthStats;
use crate::queue::QueueStats;

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use seqpipe_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(150_000), "150,000");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a duration in human-readable form.
///
/// Sub-second durations are shown in milliseconds, which is where most queue
/// benchmarks and small test pipelines land.
///
/// # Examples
///
/// ```
/// use seqpipe_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput (items per second).
///
/// # Examples
///
/// ```
/// use seqpipe_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 items/s");
/// assert_eq!(format_rate(30, Duration::from_secs(60)), "30.0 items/min");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        let items_per_min = count as f64 / (secs / 60.0);
        format!("{items_per_min:.1} items/min")
    }
}

/// Logs the counters of one queue.
///
/// The throttling lines are only emitted when the producer actually stalled.
pub fn log_queue_summary(name: &str, stats: &QueueStats) {
    log::info!("Queue '{name}':");
    log::info!("  Items pushed: {}", format_count(stats.pushed));
    log::info!("  Items popped: {}", format_count(stats.popped));
    log::info!("  Peak depth: {}", format_count(stats.peak_len as u64));
    if stats.throttle_stalls > 0 {
        log::info!(
            "  Producer throttled {} time(s), {}ms blocked",
            format_count(stats.throttle_stalls),
            stats.producer_blocked_ms
        );
    }
    log::debug!("  Consumer waited {}ms for input", stats.consumer_wait_ms);
}

/// Logs a length distribution, e.g. the line lengths seen by a relay.
pub fn log_length_summary(what: &str, stats: &LengthStats) {
    match stats.summary() {
        Some(summary) => log::info!(
            "There were {} {what}. Median length: {} Average length {:.1} +- {:.1} deviation",
            format_count(summary.count),
            summary.median,
            summary.mean,
            summary.std_dev
        ),
        None => log::info!("There were no {what}."),
    }
}

/// Operation timing and summary helper.
///
/// # Examples
///
/// ```no_run
/// use seqpipe_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Relaying lines");
///
/// // ... do work ...
///
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
