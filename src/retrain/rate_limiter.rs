//! Per-entity retraining cooldown.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::storage::{JobStore, JobStatus};

/// Result of a rate-limit check.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub last_trigger_time: Option<DateTime<Utc>>,
    pub hours_since_last: Option<f64>,
    /// Set when the job log could not be read and the check failed open
    pub error: Option<String>,
}

impl RateLimitDecision {
    fn allow() -> Self {
        Self { allowed: true, last_trigger_time: None, hours_since_last: None, error: None }
    }
}

/// Enforces a minimum interval between retraining jobs for one entity,
/// using the most recent `pending` job as the last trigger.
///
/// Fails open: if the job log cannot be queried the call is allowed.
#[derive(Clone)]
pub struct RateLimiter {
    jobs: Arc<dyn JobStore>,
}

impl RateLimiter {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }

    pub fn check(&self, entity_id: &str, min_interval_hours: f64) -> RateLimitDecision {
        self.check_at(entity_id, min_interval_hours, Utc::now())
    }

    pub fn check_at(
        &self,
        entity_id: &str,
        min_interval_hours: f64,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        match self.jobs.latest_job(entity_id, Some(JobStatus::Pending)) {
            Ok(None) => RateLimitDecision::allow(),
            Ok(Some(job)) => {
                let hours = (now - job.triggered_at).num_milliseconds() as f64 / 3_600_000.0;
                RateLimitDecision {
                    allowed: hours >= min_interval_hours,
                    last_trigger_time: Some(job.triggered_at),
                    hours_since_last: Some(hours),
                    error: None,
                }
            }
            Err(e) => {
                error!(entity = %entity_id, error = %e, "failed to check rate limit, allowing");
                RateLimitDecision { error: Some(e.to_string()), ..RateLimitDecision::allow() }
            }
        }
    }
}
