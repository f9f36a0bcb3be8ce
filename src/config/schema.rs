//! YAML schema for the drift monitor configuration.
//!
//! Every section carries `#[serde(default)]`, so a partial file (or none at
//! all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::eval::drift::{
    DriftWeights, SeverityCutoffs, DEFAULT_BINS, DEFAULT_MIN_SAMPLES, DEFAULT_SAMPLE_CAP,
    DEFAULT_SEED,
};

/// Complete monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilarConfig {
    /// Dataset locations and column names
    pub data: DataConfig,

    /// Drift thresholds and scan bounds
    pub drift: DriftConfig,

    /// Retraining service and its guards
    pub retraining: RetrainingConfig,

    /// Webhook notifications
    pub notifications: NotificationsConfig,

    /// Alert / job / approval persistence
    pub storage: StorageConfig,
}

/// Dataset configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Reference window snapshot
    pub baseline: PathBuf,
    /// Live feature dataset
    pub current: PathBuf,
    /// Column identifying the tracked entity
    pub entity_column: String,
    /// Observation time column
    pub timestamp_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            baseline: PathBuf::from("data/processed/baseline_features.parquet"),
            current: PathBuf::from("data/processed/features_dataset.parquet"),
            entity_column: "ticker".to_string(),
            timestamp_column: "date".to_string(),
        }
    }
}

/// Drift detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// KS significance level
    pub alpha: f64,
    /// PSI drift threshold
    pub psi_threshold: f64,
    /// Feature columns to monitor
    pub features: Vec<String>,
    /// Days of current data compared, counted back from the latest row
    pub lookback_days: u32,
    /// Upper bound on entities per scan
    pub max_tickers: usize,
    /// Per-side sample cap before downsampling
    pub sample_size: usize,
    /// PSI bins
    pub bins: usize,
    /// Minimum observations per side for a feature to be compared
    pub min_samples: usize,
    /// Downsampling seed
    pub seed: u64,
    /// Evaluation threads
    pub workers: usize,
    pub weights: DriftWeights,
    pub severity: SeverityCutoffs,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            psi_threshold: 0.2,
            features: vec!["sma_20".to_string(), "rsi_14".to_string(), "volatility".to_string()],
            lookback_days: 60,
            max_tickers: 50,
            sample_size: DEFAULT_SAMPLE_CAP,
            bins: DEFAULT_BINS,
            min_samples: DEFAULT_MIN_SAMPLES,
            seed: DEFAULT_SEED,
            workers: 1,
            weights: DriftWeights::default(),
            severity: SeverityCutoffs::default(),
        }
    }
}

/// Retraining service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrainingConfig {
    /// Hand drifted entities to the coordinator at all
    pub enabled: bool,
    /// Service root; `None` disables the external call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_seconds: f64,
    pub min_retrain_interval_hours: f64,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_timeout_seconds: u64,
    /// Recorded on automatic jobs
    pub triggered_by: String,
}

impl Default for RetrainingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            api_key: None,
            timeout_seconds: 10,
            max_retries: 3,
            backoff_seconds: 1.0,
            min_retrain_interval_hours: 6.0,
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_timeout_seconds: 300,
            triggered_by: "auto_drift_system".to_string(),
        }
    }
}

/// Webhook notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub enabled: bool,
    pub timeout_seconds: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { webhook_url: None, enabled: true, timeout_seconds: 5 }
    }
}

/// Persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database file
    #[default]
    Sqlite,
    /// Single JSON document
    Json,
    /// Process memory; nothing survives the run
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database or JSON file; ignored for the memory backend
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Sqlite, path: PathBuf::from("data/vigilar.db") }
    }
}
