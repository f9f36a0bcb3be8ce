//! Declarative configuration
//!
//! A YAML file (`vigilar.yaml` by default) holds every threshold and endpoint.
//! Secrets and deployment-specific paths can come from the environment
//! instead:
//!
//! ```yaml
//! data:
//!   baseline: data/processed/baseline_features.parquet
//!   current: data/processed/features_dataset.parquet
//! drift:
//!   alpha: 0.05
//!   psi_threshold: 0.2
//!   features: [sma_20, rsi_14, volatility]
//! retraining:
//!   min_retrain_interval_hours: 6
//! storage:
//!   backend: sqlite
//!   path: data/vigilar.db
//! ```

mod cli;
mod loader;
mod schema;
mod validate;


pub use cli::{
    Cli, Command, CompareArgs, OutputFormat, RetrainArgs, ScanArgs, ValidateArgs,
};
pub use loader::{
    load_config, parse_config, ENV_API_BASE_URL, ENV_API_KEY, ENV_BASELINE_PATH, ENV_WEBHOOK_URL,
};
pub use schema::{
    DataConfig, DriftConfig, NotificationsConfig, RetrainingConfig, StorageBackend, StorageConfig,
    VigilarConfig,
};
pub use validate::{validate_config, ValidationError, MAX_BACKOFF_SECONDS, MAX_LOOKBACK_DAYS};
