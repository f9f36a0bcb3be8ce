//! JSON file-based store implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::StorageResult;
use super::in_memory::StoreState;
use super::records::{AlertRecord, ApprovalPolicy, JobStatus, RetrainJobRecord};
use super::traits::{latest_matching, AlertStore, ApprovalStore, JobStore};

/// JSON file-based store.
///
/// The whole document `{alerts, jobs, approvals}` is rewritten on every
/// insert. A failed write leaves the in-memory view unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Create or open a JSON file store
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                StoreState::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            StoreState::default()
        };

        Ok(Self { path, state: Mutex::new(state) })
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a copy of the state, write it out, then commit.
    fn write_through(&self, change: impl FnOnce(&mut StoreState)) -> StorageResult<()> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        change(&mut next);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&next)?;
        std::fs::write(&self.path, json)?;

        *guard = next;
        Ok(())
    }
}

impl AlertStore for JsonFileStore {
    fn insert_alerts(&self, alerts: &[AlertRecord]) -> StorageResult<()> {
        self.write_through(|s| s.alerts.extend_from_slice(alerts))
    }

    fn alerts(&self, entity_id: Option<&str>) -> StorageResult<Vec<AlertRecord>> {
        Ok(self.lock().alerts_for(entity_id))
    }
}

impl JobStore for JsonFileStore {
    fn insert_job(&self, job: &RetrainJobRecord) -> StorageResult<()> {
        self.write_through(|s| s.jobs.push(job.clone()))
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

impl ApprovalStore for JsonFileStore {
    fn approval_policy(&self, entity_id: &str) -> StorageResult<Option<ApprovalPolicy>> {
        Ok(self.lock().policy(entity_id))
    }

    fn set_approval(&self, entity_id: &str, requires_approval: bool) -> StorageResult<()> {
        self.write_through(|s| {
            s.approvals.insert(entity_id.to_string(), requires_approval);
        })
    }
}
