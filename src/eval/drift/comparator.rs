//! Two-sample distribution comparison (KS + PSI).

use super::statistical::{
    downsample, ks_statistic, ks_two_sample_p_value, population_stability_index, sorted,
};
use super::types::Comparison;

/// Default number of PSI bins
pub const DEFAULT_BINS: usize = 10;
/// Default per-side sample cap before downsampling
pub const DEFAULT_SAMPLE_CAP: usize = 5000;
/// Default downsampling seed
pub const DEFAULT_SEED: u64 = 42;

/// Compares a baseline sample against a current sample.
///
/// Callers must not pass windows smaller than the evaluator's minimum sample
/// size; this type does not re-check it.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionComparator {
    bins: usize,
    sample_cap: usize,
    seed: u64,
}

impl Default for DistributionComparator {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, DEFAULT_SAMPLE_CAP, DEFAULT_SEED)
    }
}

impl DistributionComparator {
    pub fn new(bins: usize, sample_cap: usize, seed: u64) -> Self {
        Self { bins, sample_cap, seed }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn sample_cap(&self) -> usize {
        self.sample_cap
    }

    /// Compute the KS statistic, its p-value and the PSI.
    ///
    /// Each side larger than the sample cap is downsampled independently with
    /// the configured seed, so repeated scans over the same data agree.
    pub fn compare(&self, baseline: &[f64], current: &[f64]) -> Comparison {
        let baseline = downsample(baseline, self.sample_cap, self.seed);
        let current = downsample(current, self.sample_cap, self.seed);

        let sorted_baseline = sorted(&baseline);
        let sorted_current = sorted(&current);

        let statistic = ks_statistic(&sorted_baseline, &sorted_current);
        let p_value = ks_two_sample_p_value(statistic, baseline.len(), current.len());
        let psi = population_stability_index(&baseline, &current, self.bins);

        Comparison {
            statistic,
            p_value,
            psi,
            baseline_n: baseline.len(),
            current_n: current.len(),
        }
    }
}
