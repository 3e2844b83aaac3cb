use std::time::Duration;

use super::*;

#[test]
fn unchanged_size_is_suppressed_after_first_warning() {
    let mut limiter = WarnLimiter::new(Duration::from_secs(3600));
    assert_eq!(limiter.record(100), WarnOutcome::Warn);
    assert_eq!(limiter.record(100), WarnOutcome::Suppressed);
    assert_eq!(limiter.record(100), WarnOutcome::Suppressed);
}

#[test]
fn size_change_re_triggers_a_warning() {
    let mut limiter = WarnLimiter::new(Duration::from_secs(3600));
    assert_eq!(limiter.record(100), WarnOutcome::Warn);
    assert_eq!(limiter.record(200), WarnOutcome::Warn);
}

#[test]
fn escalates_after_six_hours_worth_of_ticks() {
    // sleep_time = 1h -> threshold = 6 ticks.
    let mut limiter = WarnLimiter::new(Duration::from_secs(3600));
    for _ in 0..6 {
        limiter.record(100);
    }
    assert_eq!(limiter.record(100), WarnOutcome::Escalate);
    // Counter reset: back to a fresh warning cycle.
    assert_eq!(limiter.record(100), WarnOutcome::Suppressed);
}
