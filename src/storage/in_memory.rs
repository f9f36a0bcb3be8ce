//! In-memory store implementation

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use super::records::{AlertRecord, ApprovalPolicy, JobStatus, RetrainJobRecord};
use super::traits::{latest_matching, AlertStore, ApprovalStore, JobStore};

/// Everything a store holds; also the on-disk layout of [`super::JsonFileStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    pub(crate) alerts: Vec<AlertRecord>,
    #[serde(default)]
    pub(crate) jobs: Vec<RetrainJobRecord>,
    #[serde(default)]
    pub(crate) approvals: BTreeMap<String, bool>,
}

impl StoreState {
    pub(crate) fn alerts_for(&self, entity_id: Option<&str>) -> Vec<AlertRecord> {
        self.alerts
            .iter()
            .filter(|a| entity_id.map_or(true, |id| a.entity_id == id))
            .cloned()
            .collect()
    }

    pub(crate) fn jobs_for(&self, entity_id: Option<&str>) -> Vec<RetrainJobRecord> {
        self.jobs
            .iter()
            .filter(|j| entity_id.map_or(true, |id| j.entity_id == id))
            .cloned()
            .collect()
    }

    pub(crate) fn policy(&self, entity_id: &str) -> Option<ApprovalPolicy> {
        self.approvals.get(entity_id).map(|&requires_approval| ApprovalPolicy {
            entity_id: entity_id.to_string(),
            requires_approval,
        })
    }
}

/// In-memory store (always available, nothing persisted)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn alert_count(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn job_count(&self) -> usize {
        self.lock().jobs.len()
    }
}

impl AlertStore for InMemoryStore {
    fn insert_alerts(&self, alerts: &[AlertRecord]) -> StorageResult<()> {
        self.lock().alerts.extend_from_slice(alerts);
        Ok(())
    }

    fn alerts(&self, entity_id: Option<&str>) -> StorageResult<Vec<AlertRecord>> {
        Ok(self.lock().alerts_for(entity_id))
    }
}

impl JobStore for InMemoryStore {
    fn insert_job(&self, job: &RetrainJobRecord) -> StorageResult<()> {
        self.lock().jobs.push(job.clone());
        Ok(())
    }

    fn latest_job(
        &self,
        entity_id: &str,
        status: Option<JobStatus>,
    ) -> StorageResult<Option<RetrainJobRecord>> {
        Ok(latest_matching(&self.lock().jobs, entity_id, status))
    }

    fn jobs(&self, entity_id: Option<&str>) -> StorageResult<Vec<RetrainJobRecord>> {
        Ok(self.lock().jobs_for(entity_id))
    }
}

impl ApprovalStore for InMemoryStore {
    fn approval_policy(&self, entity_id: &str) -> StorageResult<Option<ApprovalPolicy>> {
        Ok(self.lock().policy(entity_id))
    }

    fn set_approval(&self, entity_id: &str, requires_approval: bool) -> StorageResult<()> {
        self.lock().approvals.insert(entity_id.to_string(), requires_approval);
        Ok(())
    }
}
