//! Bounded retry for polling asynchronous readiness.
//!
//! [`wait_for`] calls a boolean probe until it reports success or the
//! [`RetryPolicy`] budget (attempt count, and optionally wall-clock time) is
//! spent. The calling thread sleeps between attempts; probes are never run
//! concurrently.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ProvisionError;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Multiply the delay by `factor` after each retry, capped at `max_delay`.
    Exponential { factor: f64, max_delay: Duration },
}

/// Retry budget and pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    /// Optional wall-clock budget, checked before each retry
    pub max_elapsed: Option<Duration>,
}

impl RetryPolicy {
    /// Fixed-delay policy with `max_attempts` attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Fixed,
            max_elapsed: None,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    fn next_delay(&self, current: Duration) -> Duration {
        match self.backoff {
            Backoff::Fixed => current,
            Backoff::Exponential { factor, max_delay } => current.mul_f64(factor).min(max_delay),
        }
    }
}

impl Default for RetryPolicy {
    /// Daemon readiness default: 60 attempts, 3 seconds apart.
    fn default() -> Self {
        Self::fixed(60, Duration::from_secs(3))
    }
}

/// Polls `probe` until it returns true.
///
/// Returns the number of invocations on success. Fails with
/// [`ProvisionError::Timeout`] once `max_attempts` probes have failed or the
/// elapsed budget would be exceeded by another wait.
pub fn wait_for<F>(policy: &RetryPolicy, mut probe: F) -> Result<u32, ProvisionError>
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    let mut delay = policy.delay;
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        attempts += 1;
        if probe() {
            debug!("probe succeeded after {} attempt(s)", attempts);
            return Ok(attempts);
        }
        if attempts == policy.max_attempts {
            break;
        }
        if policy.max_elapsed.is_some_and(|budget| started.elapsed() + delay > budget) {
            break;
        }
        debug!(
            "probe attempt {}/{} failed, retrying in {:?}",
            attempts, policy.max_attempts, delay
        );
        thread::sleep(delay);
        delay = policy.next_delay(delay);
    }

    Err(ProvisionError::Timeout {
        attempts,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::ZERO)
    }

    #[test]
    fn succeeds_on_kth_call() {
        let mut calls = 0;
        let attempts = wait_for(&instant(10), || {
            calls += 1;
            calls == 4
        })
        .unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn immediate_success_calls_once() {
        let mut calls = 0;
        let attempts = wait_for(&instant(5), || {
            calls += 1;
            true
        })
        .unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn never_succeeding_probe_times_out_at_budget() {
        let mut calls = 0;
        let err = wait_for(&instant(7), || {
            calls += 1;
            false
        })
        .unwrap_err();
        assert_eq!(calls, 7);
        assert!(matches!(err, ProvisionError::Timeout { attempts: 7, .. }));
    }

    #[test]
    fn zero_attempts_never_probes() {
        let mut calls = 0;
        let err = wait_for(&instant(0), || {
            calls += 1;
            true
        })
        .unwrap_err();
        assert_eq!(calls, 0);
        assert!(matches!(err, ProvisionError::Timeout { attempts: 0, .. }));
    }

    #[test]
    fn elapsed_budget_stops_before_attempt_budget() {
        let policy = RetryPolicy::fixed(100, Duration::from_millis(20))
            .with_max_elapsed(Duration::from_millis(50));
        let mut calls = 0;
        let err = wait_for(&policy, || {
            calls += 1;
            false
        })
        .unwrap_err();
        assert!(calls < 100, "elapsed budget should cut retries short, got {}", calls);
        assert!(matches!(err, ProvisionError::Timeout { .. }));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(1)).with_backoff(
            Backoff::Exponential {
                factor: 2.0,
                max_delay: Duration::from_secs(3),
            },
        );
        let d1 = policy.next_delay(Duration::from_secs(1));
        let d2 = policy.next_delay(d1);
        assert_eq!(d1, Duration::from_secs(2));
        assert_eq!(d2, Duration::from_secs(3));
    }

    #[test]
    fn default_policy_matches_daemon_readiness_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert_eq!(policy.backoff, Backoff::Fixed);
    }
}
