//! Human approval gate.

use std::sync::Arc;

use tracing::error;

use crate::storage::ApprovalStore;

/// Reads the per-entity `requires_approval` flag.
///
/// Fails closed: an unreadable policy store blocks automatic retraining.
/// Entities without a policy row do not require approval.
#[derive(Clone)]
pub struct ApprovalGate {
    store: Arc<dyn ApprovalStore>,
}

impl ApprovalGate {
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    pub fn requires_approval(&self, entity_id: &str) -> bool {
        match self.store.approval_policy(entity_id) {
            Ok(policy) => policy.is_some_and(|p| p.requires_approval),
            Err(e) => {
                error!(
                    entity = %entity_id,
                    error = %e,
                    "failed to check approval policy, requiring approval"
                );
                true
            }
        }
    }
}
