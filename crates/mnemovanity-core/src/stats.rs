//! Caller-side throughput aggregation

use std::time::{Duration, Instant};

use crate::manager::GenerationManager;
use crate::result::{MatchResult, ThroughputTick};

/// Running totals for one search session, fed from the manager's channels
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    checked: u64,
    found: u64,
    start_time: Instant,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self {
            checked: 0,
            found: 0,
            start_time: Instant::now(),
        }
    }

    /// Zero the totals and restart the clock
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_checked(&mut self, tick: ThroughputTick) {
        self.checked += tick;
    }

    pub fn record_found(&mut self, count: u64) {
        self.found += count;
    }

    /// Drain both channels once: ticks go into the totals, results are returned.
    pub fn poll(&mut self, manager: &GenerationManager) -> Vec<MatchResult> {
        self.record_checked(manager.drain_counts());
        let results = manager.try_results();
        self.record_found(results.len() as u64);
        results
    }

    pub fn total_checked(&self) -> u64 {
        self.checked
    }

    pub fn found(&self) -> u64 {
        self.found
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Addresses checked per second since the last reset
    pub fn rate(&self) -> f64 {
        rate(self.checked, self.elapsed())
    }

    pub fn status_line(&self) -> String {
        status_line(self.checked, self.elapsed(), self.found)
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

fn rate(checked: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        checked as f64 / secs
    } else {
        0.0
    }
}

fn status_line(checked: u64, elapsed: Duration, found: u64) -> String {
    format!(
        "Checked {} | Speed {}/s | Found {}",
        format_count(checked),
        format_count(rate(checked, elapsed) as u64),
        found
    )
}

/// Compact count: `999`, `12.35K`, `4.20M`, ...
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000_000_000 {
        format!("{:.2}T", n as f64 / 1e12)
    } else if n >= 1_000_000_000 {
        format!("{:.2}G", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        format!("{}", n)
    }
}
