//! Logging and stage timing for apkforge
//!
//! - Structured logging with tracing, filtered by `RUST_LOG` or a configured level
//! - A per-process session id attached to the init event
//! - Timers that report how long each pipeline stage took

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Map a `-v` repetition count onto a filter level, starting from `base`
pub fn level_for_verbosity(base: &str, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    let levels = ["error", "warn", "info", "debug", "trace"];
    let start = levels.iter().position(|l| l.eq_ignore_ascii_case(base)).unwrap_or(1);
    let idx = (start + usize::from(verbose)).min(levels.len() - 1);
    levels[idx].to_string()
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            show_target: false,
            json: false,
        }
    }
}

/// Timer for measuring a pipeline stage
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            stage = self.name,
            duration_us = duration.as_micros() as u64,
            "Stage completed"
        );
        duration
    }
}

/// Run a closure inside an info span, timing it
#[macro_export]
macro_rules! timed_span {
    ($name:expr, $body:expr) => {{
        let _span = tracing::info_span!($name).entered();
        let timer = $crate::Timer::start($name);
        let out = $body;
        timer.stop();
        out
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_timed_span_returns_value() {
        let value = timed_span!("sum", (1..=4).sum::<u32>());
        assert_eq!(value, 10);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity("warn", 0, false), "warn");
        assert_eq!(level_for_verbosity("warn", 1, false), "info");
        assert_eq!(level_for_verbosity("warn", 9, false), "trace");
        assert_eq!(level_for_verbosity("info", 3, true), "error");
        assert_eq!(level_for_verbosity("bogus", 0, false), "warn");
    }
}
