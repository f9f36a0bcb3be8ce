//! Persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::eval::drift::{DriftMeasurement, Severity};

/// One drifted feature of one entity, as written to the alert log.
///
/// Append-only: records are never updated after insertion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub entity_id: String,
    pub feature: String,
    pub p_value: f64,
    pub statistic: f64,
    pub psi: f64,
    pub drift_score: f64,
    pub severity: Severity,
    /// Significance level in force when the alert was raised
    pub alpha: f64,
    pub baseline_n: usize,
    pub current_n: usize,
    pub detected_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn from_measurement(
        entity_id: &str,
        feature: &str,
        m: &DriftMeasurement,
        alpha: f64,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            feature: feature.to_string(),
            p_value: m.p_value,
            statistic: m.statistic,
            psi: m.psi,
            drift_score: m.drift_score,
            severity: m.severity,
            alpha,
            baseline_n: m.baseline_n,
            current_n: m.current_n,
            detected_at,
        }
    }
}

/// Outcome of the call to the retraining service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Timeout,
    Failed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Timeout => "timeout",
            CallStatus::Failed => "failed",
        }
    }
}

impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(CallStatus::Success),
            "timeout" => Ok(CallStatus::Timeout),
            "failed" => Ok(CallStatus::Failed),
            other => Err(format!("unknown call status '{other}'")),
        }
    }
}

/// Lifecycle of a retraining job.
///
/// Jobs are written as `Pending` (call accepted) or `Failed` (call failed);
/// later states are set by the retraining service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

/// One retraining attempt. Audit log and rate-limit source of truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrainJobRecord {
    pub entity_id: String,
    pub triggered_at: DateTime<Utc>,
    pub triggered_by: String,
    pub drift_severity: Severity,
    #[serde(default)]
    pub drift_features: Vec<String>,
    pub external_job_id: Option<String>,
    pub call_status: CallStatus,
    pub outcome_status: JobStatus,
    pub error_message: Option<String>,
}

/// Per-entity approval flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    pub entity_id: String,
    pub requires_approval: bool,
}
