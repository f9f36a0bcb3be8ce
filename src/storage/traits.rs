//! Storage trait definitions

use std::sync::Arc;

use super::error::StorageResult;
use super::records::{AlertRecord, ApprovalPolicy, JobStatus, RetrainJobRecord};

/// Append-only drift alert log
pub trait AlertStore: Send + Sync {
    /// Insert a batch of alerts; all or nothing where the backend allows it
    fn insert_alerts(&self, alerts: &[AlertRecord]) -> StorageResult<()>;

    /// Alerts for one entity, or all alerts, oldest first
    fn alerts(&self, entity_id: Option<&str>) -> StorageResult<Vec<AlertRecord>>;
}

/// Retraining job log
pub trait JobStore: Send + Sync {
    /// Append one job record
    fn insert_job(&self, job: &RetrainJobRecord) -> StorageResult<()>;

    /// Most recent job for an entity, optionally restricted to one status
    fn latest_job(
        &self,
        entity_id: &str,
        status: Option<JobStatus>,
    ) -> StorageResult<Option<RetrainJobRecord>>;

    /// Jobs for one entity, or all jobs, oldest first
    fn jobs(&self, entity_id: Option<&str>) -> StorageResult<Vec<RetrainJobRecord>>;
}

/// Per-entity approval policies
pub trait ApprovalStore: Send + Sync {
    fn approval_policy(&self, entity_id: &str) -> StorageResult<Option<ApprovalPolicy>>;

    fn set_approval(&self, entity_id: &str, requires_approval: bool) -> StorageResult<()>;
}

/// A backend that holds all three record kinds
pub trait Store: AlertStore + JobStore + ApprovalStore {}

impl<T: AlertStore + JobStore + ApprovalStore> Store for T {}

/// Latest of the jobs matching `entity_id` and `status`, by `triggered_at`.
pub(crate) fn latest_matching<'a>(
    jobs: impl IntoIterator<Item = &'a RetrainJobRecord>,
    entity_id: &str,
    status: Option<JobStatus>,
) -> Option<RetrainJobRecord> {
    jobs.into_iter()
        .filter(|j| j.entity_id == entity_id && status.map_or(true, |s| j.outcome_status == s))
        .max_by_key(|j| j.triggered_at)
        .cloned()
}

/// One backend viewed through each narrow trait.
#[derive(Clone)]
pub struct Stores {
    pub alerts: Arc<dyn AlertStore>,
    pub jobs: Arc<dyn JobStore>,
    pub approvals: Arc<dyn ApprovalStore>,
}

impl Stores {
    pub fn from_backend<S: Store + 'static>(backend: Arc<S>) -> Self {
        Self { alerts: backend.clone(), jobs: backend.clone(), approvals: backend }
    }
}
