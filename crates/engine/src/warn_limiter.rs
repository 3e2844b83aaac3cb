// SPDX-License-Identifier: MIT

//! A small rate-limiter for the quota-pressure warning in `check_new_jobs`.

use std::time::Duration;

/// Suppresses repeated identical warnings, escalating to a single ERROR once
/// a service has been stuck under quota pressure for roughly
/// `6h / sleep_time` ticks.
#[derive(Debug, Clone)]
pub struct WarnLimiter {
    threshold: u32,
    count: u32,
    last_size: Option<u64>,
}

impl WarnLimiter {
    /// `sleep_time` is the control loop's tick cadence; the escalation
    /// threshold is `6h` worth of ticks.
    pub fn new(sleep_time: Duration) -> Self {
        let ticks_per_six_hours = Duration::from_secs(6 * 3600).as_secs_f64()
            / sleep_time.as_secs_f64().max(f64::EPSILON);
        Self {
            threshold: ticks_per_six_hours.round().max(1.0) as u32,
            count: 0,
            last_size: None,
        }
    }

    /// Record one more throttled tick for `current_size` bytes. Returns
    /// `Warn` when the size changed since the last warning (log at WARNING),
    /// `Escalate` when the threshold was just crossed (log at ERROR, counter
    /// resets), or `Suppressed` otherwise.
    pub fn record(&mut self, current_size: u64) -> WarnOutcome {
        let size_changed = self.last_size != Some(current_size);
        if size_changed {
            self.last_size = Some(current_size);
        }

        if self.count < self.threshold {
            self.count += 1;
        } else {
            self.count = 0;
            return WarnOutcome::Escalate;
        }
        if size_changed {
            return WarnOutcome::Warn;
        }
        WarnOutcome::Suppressed
    }

    /// Clear the counter once quota pressure has cleared, so a later
    /// recurrence starts its own escalation window rather than inheriting
    /// whatever count was left over from the last one.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnOutcome {
    Warn,
    Escalate,
    Suppressed,
}

#[cfg(test)]
#[path = "warn_limiter_tests.rs"]
mod tests;
