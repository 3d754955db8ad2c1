use std::cell::Cell;
use std::time::{Duration, Instant};

use rsprovision::ProvisionError;
use rsprovision::retry::{Backoff, RetryPolicy, wait_for};

#[test]
fn probe_succeeding_on_third_call_returns_three() {
    let calls = Cell::new(0);
    let attempts = wait_for(&RetryPolicy::fixed(5, Duration::ZERO), || {
        calls.set(calls.get() + 1);
        calls.get() == 3
    })
    .unwrap();
    assert_eq!(attempts, 3);
    assert_eq!(calls.get(), 3);
}

#[test]
fn exhausted_budget_reports_attempts() {
    let calls = Cell::new(0);
    let err = wait_for(&RetryPolicy::fixed(4, Duration::ZERO), || {
        calls.set(calls.get() + 1);
        false
    })
    .unwrap_err();
    assert_eq!(calls.get(), 4);
    assert!(matches!(err, ProvisionError::Timeout { attempts: 4, .. }));
}

#[test]
fn sleeps_between_attempts_but_not_after_last() {
    let delay = Duration::from_millis(30);
    let started = Instant::now();
    let _ = wait_for(&RetryPolicy::fixed(3, delay), || false);
    let elapsed = started.elapsed();
    assert!(elapsed >= delay * 2, "expected two sleeps, took {:?}", elapsed);
    assert!(elapsed < delay * 3 + Duration::from_millis(500));
}

#[test]
fn exponential_backoff_still_counts_attempts() {
    let policy = RetryPolicy::fixed(3, Duration::from_millis(1)).with_backoff(Backoff::Exponential {
        factor: 2.0,
        max_delay: Duration::from_millis(2),
    });
    let calls = Cell::new(0);
    let result = wait_for(&policy, || {
        calls.set(calls.get() + 1);
        false
    });
    assert!(result.is_err());
    assert_eq!(calls.get(), 3);
}
