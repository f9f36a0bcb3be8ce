//! Scan settings and results.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::eval::drift::{EntityDriftReport, FeatureDriftEvaluator};
use crate::retrain::RetrainOutcome;

/// How a scan pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Entities were evaluated (drift may or may not have been found)
    Ok,
    /// No baseline snapshot yet; expected before the first snapshot
    BaselineMissing,
    /// No current dataset to compare
    CurrentMissing,
    /// Current dataset lacks the entity or timestamp column
    BadSchema,
    /// No entity appears in both windows
    NoCommonTickers,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Ok => "ok",
            ScanStatus::BaselineMissing => "baseline_missing",
            ScanStatus::CurrentMissing => "current_missing",
            ScanStatus::BadSchema => "bad_schema",
            ScanStatus::NoCommonTickers => "no_common_tickers",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one scan pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanSummary {
    pub status: ScanStatus,
    /// Alert rows actually persisted (0 when the batch insert failed)
    pub alerts_created: usize,
    /// Entities whose retraining call was accepted
    pub retraining_triggered: usize,
    pub tickers_evaluated: usize,
    pub tickers_with_drift: usize,
    /// One report per evaluated entity, sorted by entity id
    pub reports: Vec<EntityDriftReport>,
    /// Coordinator decision per drifted entity
    pub retrain_outcomes: BTreeMap<String, RetrainOutcome>,
    pub duration_seconds: f64,
}

impl ScanSummary {
    /// Early exit with nothing evaluated
    pub fn empty(status: ScanStatus, duration_seconds: f64) -> Self {
        Self {
            status,
            alerts_created: 0,
            retraining_triggered: 0,
            tickers_evaluated: 0,
            tickers_with_drift: 0,
            reports: Vec::new(),
            retrain_outcomes: BTreeMap::new(),
            duration_seconds,
        }
    }

    /// Reports with at least one drifted feature
    pub fn drifted(&self) -> impl Iterator<Item = &EntityDriftReport> {
        self.reports.iter().filter(|r| r.has_drift())
    }
}

/// Inputs that shape one scan pass.
#[derive(Clone, Debug)]
pub struct ScanSettings {
    pub entity_column: String,
    pub timestamp_column: String,
    /// Feature columns compared for every entity
    pub features: Vec<String>,
    /// Current-window length, counted back from the latest timestamp
    pub lookback_days: u32,
    /// Entities beyond this many (in sorted order) are not evaluated
    pub max_tickers: usize,
    /// Evaluation threads; side effects always run on the calling thread
    pub workers: usize,
    pub evaluator: FeatureDriftEvaluator,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            entity_column: "ticker".to_string(),
            timestamp_column: "date".to_string(),
            features: vec!["sma_20".to_string(), "rsi_14".to_string(), "volatility".to_string()],
            lookback_days: 60,
            max_tickers: 50,
            workers: 1,
            evaluator: FeatureDriftEvaluator::default(),
        }
    }
}
