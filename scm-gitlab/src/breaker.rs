//! Circuit breaker guarding every outbound GitLab call.
//!
//! States:
//! - Closed: calls pass through, consecutive failures are counted
//! - Open: calls are rejected without touching the network until the cooldown elapses
//! - HalfOpen: a single trial call decides between Closed and Open
//!
//! The state lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; callers hold a [`CallPermit`] for the duration of the request instead.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{ScmError, ScmResult};

/// Breaker tuning. Defaults: 10 s per-call timeout, 5 consecutive failures, 60 s cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerOptions {
    /// Per-call timeout applied by the gateway; a timeout counts as a failure.
    pub timeout: Duration,
    /// Consecutive failures that open a closed breaker.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing a trial.
    pub cooldown: Duration,
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Cumulative call statistics, as reported by `stats()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStats {
    pub state: BreakerState,
    /// Calls that were allowed through to the network.
    pub total_calls: u64,
    pub successes: u64,
    /// Failed calls, timeouts included.
    pub failures: u64,
    pub timeouts: u64,
    /// Calls rejected while open or while a half-open trial was in flight.
    pub rejected: u64,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    total_calls: u64,
    successes: u64,
    failures: u64,
    timeouts: u64,
    rejected: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    options: BreakerOptions,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(options: BreakerOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
                total_calls: 0,
                successes: 0,
                failures: 0,
                timeouts: 0,
                rejected: 0,
            }),
        }
    }

    pub fn options(&self) -> &BreakerOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Asks for permission to issue one call.
    ///
    /// Fails with [`ScmError::BreakerOpen`] while open (cooldown running) or while
    /// another half-open trial is in flight.
    pub fn acquire(&self) -> ScmResult<CallPermit<'_>> {
        let mut inner = self.lock();

        let trial = match inner.state {
            BreakerState::Closed => false,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .is_none_or(|at| at.elapsed() >= self.options.cooldown);
                if !cooled {
                    inner.rejected += 1;
                    debug!("circuit breaker open, rejecting call");
                    return Err(ScmError::BreakerOpen);
                }
                inner.state = BreakerState::HalfOpen;
                info!("circuit breaker entering half-open state");
                true
            }
            BreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    inner.rejected += 1;
                    debug!("half-open trial in flight, rejecting call");
                    return Err(ScmError::BreakerOpen);
                }
                true
            }
        };

        if trial {
            inner.trial_in_flight = true;
        }
        inner.total_calls += 1;

        Ok(CallPermit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: inner.state,
            total_calls: inner.total_calls,
            successes: inner.successes,
            failures: inner.failures,
            timeouts: inner.timeouts,
            rejected: inner.rejected,
            consecutive_failures: inner.consecutive_failures,
        }
    }

    fn record_success(&self, trial: bool) {
        let mut inner = self.lock();
        inner.successes += 1;
        inner.consecutive_failures = 0;

        if trial {
            inner.trial_in_flight = false;
            inner.state = BreakerState::Closed;
            inner.opened_at = None;
            info!("circuit breaker closed after successful trial");
        }
    }

    fn record_failure(&self, trial: bool, timed_out: bool) {
        let mut inner = self.lock();
        inner.failures += 1;
        if timed_out {
            inner.timeouts += 1;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if trial {
            inner.trial_in_flight = false;
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
            warn!("circuit breaker reopened after failed trial");
            return;
        }

        if inner.state == BreakerState::Closed
            && inner.consecutive_failures >= self.options.failure_threshold
        {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
            warn!(
                consecutive_failures = inner.consecutive_failures,
                cooldown_ms = self.options.cooldown.as_millis() as u64,
                "circuit breaker opened"
            );
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        inner.trial_in_flight = false;
        debug!("half-open trial abandoned before completion");
    }
}

/// Permission for a single call. Settle it with [`CallPermit::succeed`] or
/// [`CallPermit::fail`]; dropping it unsettled frees a half-open trial slot
/// without changing the breaker state.
#[must_use = "a permit must be settled with succeed() or fail()"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success(self.trial);
    }

    pub fn fail(mut self, timed_out: bool) {
        self.settled = true;
        self.breaker.record_failure(self.trial, timed_out);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial();
        }
    }
}
