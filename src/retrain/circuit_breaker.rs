//! Circuit breaker guarding the retraining service.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Observable breaker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls permitted, failures counted
    Closed,
    /// Calls rejected until the timeout elapses
    Open,
    /// Timeout elapsed; one trial call is (or may be) in flight
    HalfOpen,
}

/// Point-in-time copy of the breaker's counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    pub is_open: bool,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
    is_open: bool,
    /// When the current recovery trial was admitted
    trial_started: Option<Instant>,
}

/// Stops calling a failing dependency for a cooldown period.
///
/// Opens once `failure_threshold` failures accumulate. After `timeout` has
/// passed since the last failure, exactly one trial call is admitted; its
/// failure re-opens the breaker for another timeout, its success closes it.
/// A trial whose outcome is never recorded stops blocking after a further
/// `timeout`.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self { failure_threshold, timeout, state: Mutex::new(BreakerState::default()) }
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may proceed now.
    pub fn can_attempt(&self) -> bool {
        self.can_attempt_at(Instant::now())
    }

    pub fn can_attempt_at(&self, now: Instant) -> bool {
        let mut s = self.lock();
        if !s.is_open {
            return true;
        }

        let cooled = s
            .last_failure_time
            .map_or(true, |t| now.saturating_duration_since(t) >= self.timeout);
        if !cooled {
            warn!(failures = s.failure_count, "circuit breaker is open, skipping call");
            return false;
        }

        if let Some(started) = s.trial_started {
            if now.saturating_duration_since(started) < self.timeout {
                return false;
            }
        }

        s.trial_started = Some(now);
        info!("circuit breaker timeout expired, admitting trial call");
        true
    }

    pub fn record_success(&self) {
        let mut s = self.lock();
        let was_tripped = s.is_open || s.failure_count > 0;
        *s = BreakerState::default();
        if was_tripped {
            info!("circuit breaker reset after successful call");
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    pub fn record_failure_at(&self, now: Instant) {
        let mut s = self.lock();
        s.failure_count = s.failure_count.saturating_add(1);
        s.last_failure_time = Some(now);
        s.trial_started = None;

        if s.failure_count >= self.failure_threshold {
            if !s.is_open {
                warn!(
                    failures = s.failure_count,
                    retry_after_secs = self.timeout.as_secs(),
                    "circuit breaker opened"
                );
            }
            s.is_open = true;
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> CircuitState {
        let s = self.lock();
        if !s.is_open {
            return CircuitState::Closed;
        }
        match s.last_failure_time {
            Some(t) if now.saturating_duration_since(t) < self.timeout => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let s = self.lock();
        BreakerSnapshot {
            failure_count: s.failure_count,
            last_failure_time: s.last_failure_time,
            is_open: s.is_open,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(300))
    }
}
