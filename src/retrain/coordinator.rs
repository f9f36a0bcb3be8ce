//! Guarded retraining decisions for drifted entities.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::approval::ApprovalGate;
use super::circuit_breaker::CircuitBreaker;
use super::client::{RetrainClient, RetrainError, RetrainRequest, DRIFT_REASON};
use super::rate_limiter::RateLimiter;
use crate::eval::drift::{EntityDriftReport, Severity};
use crate::notify::{Notification, Notifier};
use crate::storage::{CallStatus, JobStatus, JobStore, RetrainJobRecord, Stores};

/// Reason sent with operator-initiated triggers
pub const MANUAL_REASON: &str = "manual_trigger";
/// `triggered_by` for operator-initiated triggers
pub const MANUAL_TRIGGER: &str = "manual";

/// Coordinator policy knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinatorSettings {
    pub min_retrain_interval_hours: f64,
    /// Recorded on automatic job records and requests
    pub triggered_by: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self { min_retrain_interval_hours: 6.0, triggered_by: "auto_drift_system".to_string() }
    }
}

/// What the coordinator did with one entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrainOutcome {
    /// Report had no drifted features
    NoDrift,
    SkippedApproval,
    SkippedRateLimit {
        last_trigger_time: Option<DateTime<Utc>>,
        hours_since_last: Option<f64>,
    },
    SkippedCircuitOpen,
    Triggered { job_id: String },
    Failed { error: String },
}

impl RetrainOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrainOutcome::NoDrift => "no_drift",
            RetrainOutcome::SkippedApproval => "skipped_approval",
            RetrainOutcome::SkippedRateLimit { .. } => "skipped_rate_limit",
            RetrainOutcome::SkippedCircuitOpen => "skipped_circuit_open",
            RetrainOutcome::Triggered { .. } => "triggered",
            RetrainOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, RetrainOutcome::Triggered { .. })
    }
}

impl fmt::Display for RetrainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrainOutcome::Triggered { job_id } => write!(f, "triggered (job {job_id})"),
            RetrainOutcome::Failed { error } => write!(f, "failed: {error}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A retraining attempt to run through the rate limiter and breaker
struct Attempt<'a> {
    entity_id: &'a str,
    severity: Severity,
    features: Vec<String>,
    reason: &'a str,
    triggered_by: &'a str,
}

/// Decides whether a drifted entity gets retrained.
///
/// Order of checks: approval gate, rate limiter, circuit breaker, then the
/// external call. Each check can end the attempt early. Only the breaker
/// holds in-process state; it is shared through an `Arc` so several
/// coordinators can guard the same service.
pub struct RetrainingCoordinator {
    client: Arc<dyn RetrainClient>,
    jobs: Arc<dyn JobStore>,
    approval: ApprovalGate,
    rate_limiter: RateLimiter,
    breaker: Arc<CircuitBreaker>,
    notifier: Arc<dyn Notifier>,
    settings: CoordinatorSettings,
}

impl RetrainingCoordinator {
    pub fn new(
        client: Arc<dyn RetrainClient>,
        stores: &Stores,
        breaker: Arc<CircuitBreaker>,
        notifier: Arc<dyn Notifier>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            client,
            jobs: stores.jobs.clone(),
            approval: ApprovalGate::new(stores.approvals.clone()),
            rate_limiter: RateLimiter::new(stores.jobs.clone()),
            breaker,
            notifier,
            settings,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Handle one entity report from a scan.
    pub fn handle(&self, report: &EntityDriftReport) -> RetrainOutcome {
        if !report.has_drift() {
            return RetrainOutcome::NoDrift;
        }
        let entity_id = report.entity_id.as_str();
        let features = report.drifted_feature_names();

        if self.approval.requires_approval(entity_id) {
            info!(entity = %entity_id, "retraining requires approval, skipping");
            self.notifier.send(&Notification::approval_request(
                entity_id,
                report.severity,
                &features,
                Utc::now(),
            ));
            return RetrainOutcome::SkippedApproval;
        }

        self.attempt(Attempt {
            entity_id,
            severity: report.severity,
            features,
            reason: DRIFT_REASON,
            triggered_by: &self.settings.triggered_by,
        })
    }

    /// Operator-initiated retraining. The operator stands in for the
    /// approval gate; the rate limiter and breaker still apply.
    pub fn trigger_manual(
        &self,
        entity_id: &str,
        severity: Severity,
        features: Vec<String>,
    ) -> RetrainOutcome {
        info!(entity = %entity_id, "manual retraining requested");
        self.attempt(Attempt {
            entity_id,
            severity,
            features,
            reason: MANUAL_REASON,
            triggered_by: MANUAL_TRIGGER,
        })
    }

    fn attempt(&self, attempt: Attempt<'_>) -> RetrainOutcome {
        let entity_id = attempt.entity_id;
        let limit = self.settings.min_retrain_interval_hours;

        let decision = self.rate_limiter.check(entity_id, limit);
        if !decision.allowed {
            info!(
                entity = %entity_id,
                hours_since_last = decision.hours_since_last,
                min_interval_hours = limit,
                "retraining rate limited, skipping"
            );
            self.notifier.send(&Notification::rate_limit_notice(
                entity_id,
                decision.last_trigger_time,
                limit,
                Utc::now(),
            ));
            return RetrainOutcome::SkippedRateLimit {
                last_trigger_time: decision.last_trigger_time,
                hours_since_last: decision.hours_since_last,
            };
        }

        if !self.client.is_configured() {
            warn!(entity = %entity_id, "retraining API not configured, skipping call");
            return RetrainOutcome::Failed { error: RetrainError::NotConfigured.to_string() };
        }

        if !self.breaker.can_attempt() {
            return RetrainOutcome::SkippedCircuitOpen;
        }

        let request = RetrainRequest {
            entity_id: entity_id.to_string(),
            reason: attempt.reason.to_string(),
            drift_severity: attempt.severity,
            drift_features: attempt.features,
            triggered_at: Utc::now(),
            triggered_by: attempt.triggered_by.to_string(),
        };

        match self.client.trigger(&request) {
            Ok(response) => {
                self.breaker.record_success();
                info!(entity = %entity_id, job_id = %response.job_id, "retraining triggered");
                self.log_job(&request, Some(response.job_id.clone()), CallStatus::Success, None);
                self.notifier.send(&Notification::retraining_confirmation(
                    entity_id,
                    &response.job_id,
                    request.drift_severity,
                    &request.triggered_by,
                    Utc::now(),
                ));
                RetrainOutcome::Triggered { job_id: response.job_id }
            }
            Err(e) if !e.counts_as_failure() => {
                warn!(entity = %entity_id, error = %e, "retraining not attempted");
                RetrainOutcome::Failed { error: e.to_string() }
            }
            Err(e) => {
                self.breaker.record_failure();
                error!(entity = %entity_id, error = %e, "retraining trigger failed");
                self.log_job(&request, None, e.call_status(), Some(e.to_string()));
                self.notifier.send(&Notification::error_alert(
                    entity_id,
                    "RETRAIN_TRIGGER_FAILED",
                    &e.to_string(),
                    &[
                        ("severity".to_string(), request.drift_severity.to_string()),
                        ("features".to_string(), request.drift_features.join(", ")),
                    ],
                    Utc::now(),
                ));
                RetrainOutcome::Failed { error: e.to_string() }
            }
        }
    }

    /// Job-log failures are logged and swallowed; the external call has
    /// already happened.
    fn log_job(
        &self,
        request: &RetrainRequest,
        external_job_id: Option<String>,
        call_status: CallStatus,
        error_message: Option<String>,
    ) {
        let outcome_status = match call_status {
            CallStatus::Success => JobStatus::Pending,
            CallStatus::Timeout | CallStatus::Failed => JobStatus::Failed,
        };
        let record = RetrainJobRecord {
            entity_id: request.entity_id.clone(),
            triggered_at: request.triggered_at,
            triggered_by: request.triggered_by.clone(),
            drift_severity: request.drift_severity,
            drift_features: request.drift_features.clone(),
            external_job_id,
            call_status,
            outcome_status,
            error_message,
        };
        if let Err(e) = self.jobs.insert_job(&record) {
            error!(entity = %request.entity_id, error = %e, "failed to record retraining job");
        }
    }
}
