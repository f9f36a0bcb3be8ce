//! Per-entity feature drift evaluation.

use std::collections::{BTreeMap, BTreeSet};

use super::comparator::DistributionComparator;
use super::types::{DriftMeasurement, DriftWeights, EntityDriftReport, Severity, SeverityCutoffs};
use crate::data::FeatureFrame;

/// Windows smaller than this are skipped as statistically underpowered
pub const DEFAULT_MIN_SAMPLES: usize = 30;

/// Thresholds that turn a comparison into a drift verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftPolicy {
    /// KS significance level; `p < alpha` counts as drift
    pub alpha: f64,
    /// PSI at or above this counts as drift
    pub psi_threshold: f64,
    pub weights: DriftWeights,
    pub cutoffs: SeverityCutoffs,
    /// Minimum finite observations required on each side
    pub min_samples: usize,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            psi_threshold: 0.2,
            weights: DriftWeights::default(),
            cutoffs: SeverityCutoffs::default(),
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Runs the comparator over each requested feature and scores the result.
///
/// Pure: no I/O, no shared state, safe to call from several threads.
#[derive(Clone, Debug, Default)]
pub struct FeatureDriftEvaluator {
    comparator: DistributionComparator,
    policy: DriftPolicy,
}

impl FeatureDriftEvaluator {
    pub fn new(comparator: DistributionComparator, policy: DriftPolicy) -> Self {
        Self { comparator, policy }
    }

    pub fn policy(&self) -> &DriftPolicy {
        &self.policy
    }

    pub fn comparator(&self) -> &DistributionComparator {
        &self.comparator
    }

    /// Either gate alone is enough.
    pub fn is_drift(&self, p_value: f64, psi: f64) -> bool {
        p_value < self.policy.alpha || psi >= self.policy.psi_threshold
    }

    /// Compare two finite samples. `None` if either side is below `min_samples`.
    pub fn measure(&self, baseline: &[f64], current: &[f64]) -> Option<DriftMeasurement> {
        if baseline.len() < self.policy.min_samples || current.len() < self.policy.min_samples {
            return None;
        }

        let cmp = self.comparator.compare(baseline, current);
        let drift_score = self.policy.weights.score(cmp.p_value, cmp.psi);

        Some(DriftMeasurement {
            statistic: cmp.statistic,
            p_value: cmp.p_value,
            psi: cmp.psi,
            drift_score,
            severity_contributing: self.is_drift(cmp.p_value, cmp.psi),
            severity: Severity::from_score(drift_score, &self.policy.cutoffs),
            baseline_n: cmp.baseline_n,
            current_n: cmp.current_n,
        })
    }

    /// Measure every requested feature present as a numeric column in both
    /// frames. Features that are missing, non-numeric or underpowered are
    /// left out of the result.
    pub fn evaluate(
        &self,
        entity_id: &str,
        features: &[String],
        baseline: &FeatureFrame,
        current: &FeatureFrame,
    ) -> BTreeMap<String, DriftMeasurement> {
        let mut out = BTreeMap::new();
        for feature in features {
            let (Some(base), Some(cur)) =
                (baseline.finite_values(feature), current.finite_values(feature))
            else {
                tracing::debug!(
                    entity = %entity_id,
                    feature = %feature,
                    "feature not in both windows"
                );
                continue;
            };

            match self.measure(&base, &cur) {
                Some(m) => {
                    tracing::debug!(
                        entity = %entity_id,
                        feature = %feature,
                        p_value = m.p_value,
                        psi = m.psi,
                        score = m.drift_score,
                        drifted = m.drifted(),
                        "feature compared"
                    );
                    out.insert(feature.clone(), m);
                }
                None => tracing::debug!(
                    entity = %entity_id,
                    feature = %feature,
                    baseline_n = base.len(),
                    current_n = cur.len(),
                    "insufficient samples, skipping"
                ),
            }
        }
        out
    }

    /// Aggregate per-feature measurements into an entity report.
    ///
    /// The average score covers drifted features when there are any,
    /// otherwise all evaluated features.
    pub fn report(
        &self,
        entity_id: &str,
        per_feature: BTreeMap<String, DriftMeasurement>,
    ) -> EntityDriftReport {
        let drifted_features: BTreeSet<String> = per_feature
            .iter()
            .filter(|(_, m)| m.drifted())
            .map(|(name, _)| name.clone())
            .collect();

        let scores: Vec<f64> = if drifted_features.is_empty() {
            per_feature.values().map(|m| m.drift_score).collect()
        } else {
            drifted_features.iter().map(|name| per_feature[name].drift_score).collect()
        };
        let avg_drift_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        EntityDriftReport {
            entity_id: entity_id.to_string(),
            drifted_features,
            avg_drift_score,
            severity: Severity::from_score(avg_drift_score, &self.policy.cutoffs),
            per_feature,
        }
    }

    /// `evaluate` followed by `report`.
    pub fn evaluate_entity(
        &self,
        entity_id: &str,
        features: &[String],
        baseline: &FeatureFrame,
        current: &FeatureFrame,
    ) -> EntityDriftReport {
        let per_feature = self.evaluate(entity_id, features, baseline, current);
        self.report(entity_id, per_feature)
    }
}
