//! Guarded auto-retraining.
//!
//! A drifted entity passes through, in order:
//! 1. [`ApprovalGate`]: per-entity human approval flag (fails closed)
//! 2. [`RateLimiter`]: minimum hours between pending jobs (fails open)
//! 3. [`CircuitBreaker`]: stops calling a failing retraining service
//! 4. [`RetrainClient`]: the external call, retried on transient errors
//!
//! [`RetrainingCoordinator`] runs the sequence, writes the job log and sends
//! the matching notification.

mod approval;
mod circuit_breaker;
mod client;
mod coordinator;
mod rate_limiter;


pub use approval::ApprovalGate;
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use client::{
    job_id_from, HttpRetrainClient, RetrainClient, RetrainError, RetrainRequest,
    RetrainResponse, RetryPolicy, DRIFT_REASON,
};
pub use coordinator::{
    CoordinatorSettings, RetrainOutcome, RetrainingCoordinator, MANUAL_REASON, MANUAL_TRIGGER,
};
pub use rate_limiter::{RateLimitDecision, RateLimiter};
