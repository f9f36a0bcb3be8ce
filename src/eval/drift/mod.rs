//! Drift detection.
//!
//! Compares a baseline feature window against a current one and decides,
//! per feature, whether the distribution has moved:
//! - two-sample Kolmogorov-Smirnov test (p-value against `alpha`)
//! - Population Stability Index over baseline quantile bins
//!
//! Either test tripping marks the feature as drifted. The two are also
//! blended into a score in [0, 1] that drives severity.

mod comparator;
mod evaluator;
mod statistical;
mod types;


pub use comparator::{DistributionComparator, DEFAULT_BINS, DEFAULT_SAMPLE_CAP, DEFAULT_SEED};
pub use evaluator::{DriftPolicy, FeatureDriftEvaluator, DEFAULT_MIN_SAMPLES};
pub use types::{
    Comparison, DriftMeasurement, DriftWeights, EntityDriftReport, Severity, SeverityCutoffs,
};

// Statistical building blocks, exposed for ad-hoc analysis
pub use statistical::{
    bin_counts, ks_p_value, ks_statistic, ks_two_sample_p_value, population_stability_index,
    quantile_breakpoints, PSI_EPSILON,
};
