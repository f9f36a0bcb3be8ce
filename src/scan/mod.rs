//! Drift scan pass.
//!
//! 1. Load baseline and current datasets (absent is a status, not an error)
//! 2. Restrict current data to the lookback window ending at its own latest row
//! 3. Evaluate entities present in both, sorted and capped at `max_tickers`
//! 4. Persist one alert per drifted feature in a single batch
//! 5. Notify and forward drifted entities to the retraining coordinator

mod builder;
mod orchestrator;
mod types;

#[cfg(test)]
mod tests;

pub use builder::Runtime;
pub use orchestrator::DriftScanOrchestrator;
pub use types::{ScanSettings, ScanStatus, ScanSummary};
