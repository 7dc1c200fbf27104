//! Scoped timing instrumentation.
//!
//! [`timing_guard`] hands back an RAII guard that logs the elapsed duration
//! of a scope when dropped. The level check happens once at creation against
//! the `stylize::telemetry` target, so a filtered-out logger leaves the guard
//! inert.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use log::{Level, log, log_enabled};

const TARGET: &str = "stylize::telemetry";

/// RAII guard that logs how long a scope took when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    /// Returns `true` when the guard will emit a log entry on drop.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Elapsed duration since the guard was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Time a scope, logging at `level` when that level is enabled for the
/// `stylize::telemetry` target (e.g. via `RUST_LOG=stylize=debug`).
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active: log_enabled!(target: TARGET, level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_inert_without_a_logger() {
        let guard = timing_guard("noop", Level::Trace);
        assert!(!guard.is_active());
        assert!(guard.elapsed() < Duration::from_secs(1));
    }
}
