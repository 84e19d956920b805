//! Process clock and health report.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process start time, captured once.
#[derive(Debug, Clone, Copy)]
pub struct ProcessClock {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl ProcessClock {
    /// Capture the current instant as the process start.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Clock whose start lies `ago` in the past.
    pub fn started_ago(ago: Duration) -> Self {
        let now = Instant::now();
        let started = now.checked_sub(ago).unwrap_or(now);
        let started_at = chrono::Duration::from_std(ago)
            .ok()
            .and_then(|ago| Utc::now().checked_sub_signed(ago))
            .unwrap_or_else(Utc::now);
        Self {
            started,
            started_at,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time elapsed since start. Monotonic.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current health report.
    pub fn report(&self) -> HealthReport {
        HealthReport::healthy(self.uptime())
    }
}

/// Body of `/health` and `/healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Human readable, e.g. `1m 2s 345ms`.
    pub uptime: String,
    pub uptime_seconds: f64,
}

impl HealthReport {
    pub fn healthy(uptime: Duration) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            uptime: format_uptime(uptime),
            uptime_seconds: uptime.as_secs_f64(),
        }
    }
}

/// Format a duration as `1h 2m 3s 4ms`, omitting leading zero units.
pub fn format_uptime(uptime: Duration) -> String {
    let total_ms = uptime.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;

    let mut parts = Vec::with_capacity(4);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if hours > 0 || minutes > 0 || seconds > 0 {
        parts.push(format!("{}s", seconds));
    }
    parts.push(format!("{}ms", millis));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_millis(42)), "42ms");
        assert_eq!(format_uptime(Duration::from_millis(3_005)), "3s 5ms");
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m 5s 0ms");
        assert_eq!(format_uptime(Duration::from_secs(3_600)), "1h 0m 0s 0ms");
    }

    #[test]
    fn test_uptime_is_non_decreasing() {
        let clock = ProcessClock::start();
        let mut previous = clock.report().uptime_seconds;
        for _ in 0..100 {
            let current = clock.report().uptime_seconds;
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_started_ago() {
        let clock = ProcessClock::started_ago(Duration::from_secs(5));
        assert!(clock.uptime() >= Duration::from_secs(5));
        assert!(clock.started_at() < Utc::now());
    }
}
