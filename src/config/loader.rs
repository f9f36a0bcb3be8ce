//! Loading the YAML file and applying environment overrides

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::info;

use super::schema::{DriftConfig, VigilarConfig};
use super::validate::{validate_config, MAX_BACKOFF_SECONDS};
use crate::error::{Error, Result};
use crate::eval::drift::{DistributionComparator, DriftPolicy, FeatureDriftEvaluator};
use crate::retrain::{CoordinatorSettings, RetryPolicy};
use crate::scan::ScanSettings;

/// Overrides `data.baseline`
pub const ENV_BASELINE_PATH: &str = "DRIFT_BASELINE_PATH";
/// Overrides `retraining.base_url`
pub const ENV_API_BASE_URL: &str = "ML_API_BASE_URL";
/// Overrides `retraining.api_key`
pub const ENV_API_KEY: &str = "ML_API_KEY";
/// Overrides `notifications.webhook_url`
pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Load, override from the process environment, and validate.
///
/// A missing file is not an error: the defaults apply.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<VigilarConfig> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        let yaml = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        parse_config(&yaml)?
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        VigilarConfig::default()
    };

    config.apply_env_overrides(|key| std::env::var(key).ok());
    validate_config(&config).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;
    Ok(config)
}

/// Parse YAML without touching the environment or validating.
pub fn parse_config(yaml: &str) -> Result<VigilarConfig> {
    if yaml.trim().is_empty() {
        return Ok(VigilarConfig::default());
    }
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))
}

impl VigilarConfig {
    /// Apply environment overrides through `lookup`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_BASELINE_PATH) {
            self.data.baseline = path.into();
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.retraining.base_url = Some(url);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.retraining.api_key = Some(key);
        }
        if let Some(url) = get(ENV_WEBHOOK_URL) {
            self.notifications.webhook_url = Some(url);
        }
    }

    /// Settings for one scan pass
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            entity_column: self.data.entity_column.clone(),
            timestamp_column: self.data.timestamp_column.clone(),
            features: self.drift.features.clone(),
            lookback_days: self.drift.lookback_days,
            max_tickers: self.drift.max_tickers,
            workers: self.drift.workers,
            evaluator: self.drift.evaluator(),
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            min_retrain_interval_hours: self.retraining.min_retrain_interval_hours,
            triggered_by: self.retraining.triggered_by.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retraining.max_retries,
            backoff: Duration::try_from_secs_f64(self.retraining.backoff_seconds.max(0.0))
                .unwrap_or(Duration::from_secs_f64(MAX_BACKOFF_SECONDS)),
        }
    }
}

impl DriftConfig {
    /// Evaluator with these thresholds
    pub fn evaluator(&self) -> FeatureDriftEvaluator {
        FeatureDriftEvaluator::new(
            DistributionComparator::new(self.bins, self.sample_size, self.seed),
            DriftPolicy {
                alpha: self.alpha,
                psi_threshold: self.psi_threshold,
                weights: self.weights,
                cutoffs: self.severity,
                min_samples: self.min_samples,
            },
        )
    }
}
