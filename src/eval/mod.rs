//! Evaluation of baseline vs. current feature windows.
//!
//! - `drift`: two-sample KS + PSI comparison, scoring and severity

pub mod drift;

pub use drift::{
    DistributionComparator, DriftMeasurement, DriftPolicy, EntityDriftReport,
    FeatureDriftEvaluator, Severity,
};
