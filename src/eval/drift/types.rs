//! Type definitions for drift detection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Severity levels for drift, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Score below the medium cutoff
    Low,
    /// Noticeable drift
    Medium,
    /// Strong drift, retraining advised
    High,
    /// Distribution has moved out from under the model
    Critical,
}

impl Severity {
    /// Classify a drift score in [0, 1].
    pub fn from_score(score: f64, cutoffs: &SeverityCutoffs) -> Self {
        if score < cutoffs.medium {
            Severity::Low
        } else if score < cutoffs.high {
            Severity::Medium
        } else if score < cutoffs.critical {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// Upper-case label used in alerts and notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => {
                Err(format!("unknown severity '{other}' (expected LOW, MEDIUM, HIGH, CRITICAL)"))
            }
        }
    }
}

/// Score cutoffs separating the severity bands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityCutoffs {
    /// Scores at or above this are at least MEDIUM
    pub medium: f64,
    /// Scores at or above this are at least HIGH
    pub high: f64,
    /// Scores at or above this are CRITICAL
    pub critical: f64,
}

impl Default for SeverityCutoffs {
    fn default() -> Self {
        Self { medium: 0.3, high: 0.6, critical: 0.85 }
    }
}

/// Blend of the KS p-value and PSI into a single drift score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftWeights {
    /// Weight of `1 - p_value`
    pub ks: f64,
    /// Weight of the saturated PSI term
    pub psi: f64,
    /// PSI value at which the PSI term saturates at 1.0
    pub psi_saturation: f64,
}

impl Default for DriftWeights {
    fn default() -> Self {
        Self { ks: 0.7, psi: 0.3, psi_saturation: 0.3 }
    }
}

impl DriftWeights {
    /// `ks * (1 - p) + psi * min(psi_value / psi_saturation, 1)`
    pub fn score(&self, p_value: f64, psi_value: f64) -> f64 {
        let psi_term = if self.psi_saturation > 0.0 {
            (psi_value / self.psi_saturation).min(1.0)
        } else {
            1.0
        };
        (self.ks * (1.0 - p_value) + self.psi * psi_term).clamp(0.0, 1.0)
    }
}

/// Raw output of comparing two samples.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// KS statistic (max ECDF gap)
    pub statistic: f64,
    /// Asymptotic two-sided KS p-value
    pub p_value: f64,
    /// Population Stability Index
    pub psi: f64,
    /// Baseline observations used (after downsampling)
    pub baseline_n: usize,
    /// Current observations used (after downsampling)
    pub current_n: usize,
}

/// Drift result for one feature of one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftMeasurement {
    pub statistic: f64,
    pub p_value: f64,
    pub psi: f64,
    pub drift_score: f64,
    /// Whether this feature counts as drifted (KS or PSI gate tripped)
    pub severity_contributing: bool,
    /// Severity band of this feature's own drift score
    pub severity: Severity,
    pub baseline_n: usize,
    pub current_n: usize,
}

impl DriftMeasurement {
    /// Whether drift was detected on this feature
    pub fn drifted(&self) -> bool {
        self.severity_contributing
    }
}

/// Aggregated drift findings for one entity in one scan pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDriftReport {
    pub entity_id: String,
    pub drifted_features: BTreeSet<String>,
    pub avg_drift_score: f64,
    pub severity: Severity,
    pub per_feature: BTreeMap<String, DriftMeasurement>,
}

impl EntityDriftReport {
    /// Whether any feature drifted
    pub fn has_drift(&self) -> bool {
        !self.drifted_features.is_empty()
    }

    /// Drifted feature names, in sorted order
    pub fn drifted_feature_names(&self) -> Vec<String> {
        self.drifted_features.iter().cloned().collect()
    }
}
