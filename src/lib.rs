//! Vigilar: feature drift detection with guarded auto-retraining.
//!
//! Compares a stored baseline feature distribution against live data per
//! tracked entity, scores the divergence with two independent tests
//! (two-sample Kolmogorov-Smirnov and Population Stability Index), and
//! forwards drifted entities to a retraining coordinator protected by an
//! approval gate, a per-entity rate limiter and a circuit breaker.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vigilar::config::VigilarConfig;
//! use vigilar::data::FileDataset;
//! use vigilar::scan::DriftScanOrchestrator;
//! use vigilar::storage::InMemoryStore;
//!
//! let config = VigilarConfig::default();
//! let store = Arc::new(InMemoryStore::new());
//! let orchestrator = DriftScanOrchestrator::new(config.scan_settings(), store);
//! let summary = orchestrator.scan(
//!     &FileDataset::new(&config.data.baseline),
//!     &FileDataset::new(&config.data.current),
//! );
//! println!("{} alerts", summary.alerts_created);
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod notify;
pub mod retrain;
pub mod scan;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
