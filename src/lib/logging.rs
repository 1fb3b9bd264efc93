//! Logging utilities for formatted output.
//!
//! Consistent, human-readable formatting for counts, sizes, durations and rates,
//! an [`OperationTimer`] for start/finish logging, and memory-usage diagnostics.

use std::time::{Duration, Instant};

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use fsort_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a byte count using binary units.
///
/// # Examples
///
/// ```
/// use fsort_lib::logging::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MiB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats a duration in human-readable form.
///
/// # Examples
///
/// ```
/// use fsort_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
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

/// Formats a rate (lines per second) with appropriate units.
///
/// # Examples
///
/// ```
/// use fsort_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 lines/s");
/// assert_eq!(format_rate(600, Duration::from_secs(60)), "10 lines/s");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} lines/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} lines/s", format_count(rate as u64))
    } else {
        let per_min = count as f64 / (secs / 60.0);
        format!("{per_min:.1} lines/min")
    }
}

/// Resident and peak memory of the current process, in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Current resident set size.
    pub rss_kb: usize,
    /// Peak resident set size ("high water mark").
    pub peak_rss_kb: usize,
}

#[cfg(target_os = "linux")]
fn read_memory_usage() -> Option<MemoryUsage> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_proc_status(&status)
}

#[cfg(not(target_os = "linux"))]
fn read_memory_usage() -> Option<MemoryUsage> {
    None
}

/// Extracts `VmRSS` and `VmHWM` (both in kB) from the contents of `/proc/<pid>/status`.
fn parse_proc_status(status: &str) -> Option<MemoryUsage> {
    let field = |name: &str| {
        status.lines().find_map(|line| {
            line.strip_prefix(name)?.split_whitespace().find_map(|part| part.parse::<usize>().ok())
        })
    };
    let rss_kb = field("VmRSS:")?;
    let peak_rss_kb = field("VmHWM:").unwrap_or(rss_kb);
    Some(MemoryUsage { rss_kb, peak_rss_kb })
}

/// Samples the memory usage of this process on supported platforms.
#[must_use]
pub fn sample_memory_usage() -> Option<MemoryUsage> {
    read_memory_usage()
}

/// Logs the current and peak resident memory, tagged with the pipeline stage.
pub fn log_memory_usage(stage: &str) {
    match sample_memory_usage() {
        Some(usage) => log::info!(
            "[{stage}] Memory: {} resident / {} peak",
            format_bytes(usage.rss_kb as u64 * 1024),
            format_bytes(usage.peak_rss_kb as u64 * 1024)
        ),
        None => log::debug!("[{stage}] Memory usage not available on this platform"),
    }
}

/// Operation timing and summary helper.
///
/// # Examples
///
/// ```no_run
/// use fsort_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Merging files");
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

    /// Time elapsed since the timer was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with line count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} lines in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
