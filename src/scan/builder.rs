//! Wiring runtime components from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::orchestrator::DriftScanOrchestrator;
use crate::config::{NotificationsConfig, StorageBackend, StorageConfig, VigilarConfig};
use crate::error::{Error, Result};
use crate::notify::{Notifier, NullNotifier, SlackNotifier};
use crate::retrain::{CircuitBreaker, HttpRetrainClient, RetrainClient, RetrainingCoordinator};
use crate::storage::{InMemoryStore, JsonFileStore, SqliteStore, Stores};

impl StorageConfig {
    /// Open the configured backend
    pub fn open(&self) -> Result<Stores> {
        let stores = match self.backend {
            StorageBackend::Sqlite => {
                Stores::from_backend(Arc::new(SqliteStore::open(&self.path)?))
            }
            StorageBackend::Json => {
                Stores::from_backend(Arc::new(JsonFileStore::open(&self.path)?))
            }
            StorageBackend::Memory => Stores::from_backend(Arc::new(InMemoryStore::new())),
        };
        info!(backend = %self.backend, path = %self.path.display(), "opened store");
        Ok(stores)
    }
}

impl NotificationsConfig {
    /// Webhook notifier, or a null one when disabled or unconfigured
    pub fn notifier(&self) -> Result<Arc<dyn Notifier>> {
        if !self.enabled || self.webhook_url.is_none() {
            return Ok(Arc::new(NullNotifier));
        }
        let notifier = SlackNotifier::new(
            self.webhook_url.clone(),
            self.enabled,
            Duration::from_secs(self.timeout_seconds),
        )
        .map_err(|e| Error::ConfigError(format!("Failed to create webhook client: {e}")))?;
        Ok(Arc::new(notifier))
    }
}

/// Every long-lived component of one process.
pub struct Runtime {
    pub stores: Stores,
    pub notifier: Arc<dyn Notifier>,
    pub coordinator: Arc<RetrainingCoordinator>,
    pub orchestrator: DriftScanOrchestrator,
}

impl Runtime {
    /// Build from configuration.
    ///
    /// The coordinator is always built (manual triggers use it); the
    /// orchestrator only forwards to it when `retraining.enabled` and
    /// `auto_retrain` are both set.
    pub fn from_config(config: &VigilarConfig, auto_retrain: bool) -> Result<Self> {
        let stores = config.storage.open()?;
        let notifier = config.notifications.notifier()?;

        let retraining = &config.retraining;
        let client: Arc<dyn RetrainClient> = Arc::new(
            HttpRetrainClient::new(
                retraining.base_url.clone(),
                retraining.api_key.clone(),
                Duration::from_secs(retraining.timeout_seconds),
                config.retry_policy(),
            )
            .map_err(|e| Error::ConfigError(e.to_string()))?,
        );
        let breaker = Arc::new(CircuitBreaker::new(
            retraining.circuit_breaker_failure_threshold,
            Duration::from_secs(retraining.circuit_breaker_timeout_seconds),
        ));
        let coordinator = Arc::new(RetrainingCoordinator::new(
            client,
            &stores,
            breaker,
            notifier.clone(),
            config.coordinator_settings(),
        ));

        let mut orchestrator =
            DriftScanOrchestrator::new(config.scan_settings(), stores.alerts.clone())
                .with_notifier(notifier.clone());
        if retraining.enabled && auto_retrain {
            orchestrator = orchestrator.with_coordinator(coordinator.clone());
        } else {
            info!("automatic retraining disabled for this run");
        }

        Ok(Self { stores, notifier, coordinator, orchestrator })
    }
}
