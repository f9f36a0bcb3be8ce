//! Statistical helper functions for drift detection.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Floor applied to bin proportions before taking the PSI log ratio.
pub const PSI_EPSILON: f64 = 1e-4;

/// Below this λ the Kolmogorov survival function is 1 to double precision
/// and the alternating series has not started to converge.
const KS_LAMBDA_FLOOR: f64 = 0.27;

/// Sort a sample ascending, NaN-tolerant.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Two-sample Kolmogorov-Smirnov statistic on pre-sorted samples.
///
/// Walks both samples in merged order and advances past every copy of the
/// current value on both sides before measuring the ECDF gap, so ties never
/// inflate the statistic.
pub fn ks_statistic(sorted_a: &[f64], sorted_b: &[f64]) -> f64 {
    if sorted_a.is_empty() || sorted_b.is_empty() {
        return 0.0;
    }

    let n1 = sorted_a.len() as f64;
    let n2 = sorted_b.len() as f64;
    let mut i = 0usize;
    let mut j = 0usize;
    let mut d_max = 0.0f64;

    while i < sorted_a.len() && j < sorted_b.len() {
        let x = sorted_a[i].min(sorted_b[j]);
        while i < sorted_a.len() && sorted_a[i] <= x {
            i += 1;
        }
        while j < sorted_b.len() && sorted_b[j] <= x {
            j += 1;
        }
        let diff = (i as f64 / n1 - j as f64 / n2).abs();
        d_max = d_max.max(diff);
    }

    d_max
}

/// Asymptotic two-sided p-value for the two-sample KS statistic.
pub fn ks_two_sample_p_value(statistic: f64, n1: usize, n2: usize) -> f64 {
    if n1 == 0 || n2 == 0 {
        return 1.0;
    }
    let (n1, n2) = (n1 as f64, n2 as f64);
    let n_eff = (n1 * n2) / (n1 + n2);
    ks_p_value(statistic * n_eff.sqrt())
}

/// Kolmogorov distribution survival function Q(λ).
pub fn ks_p_value(lambda: f64) -> f64 {
    if lambda < KS_LAMBDA_FLOOR {
        return 1.0;
    }
    // Q(λ) = 2 * sum_{k=1}^∞ (-1)^{k+1} * exp(-2 * k^2 * λ^2)
    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-12 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Quantile of a sorted sample with linear interpolation between order
/// statistics (the numpy default).
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Distinct quantile breakpoints of a sorted baseline at `i / bins`.
pub fn quantile_breakpoints(sorted: &[f64], bins: usize) -> Vec<f64> {
    if sorted.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut edges: Vec<f64> =
        (0..=bins).map(|i| quantile(sorted, i as f64 / bins as f64)).collect();
    edges.dedup();
    edges
}

/// Count samples per bin. Bin `i` is `[edges[i], edges[i + 1])`; the outer
/// edges are treated as open so every finite value is counted.
pub fn bin_counts(data: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let interior = &edges[1..edges.len() - 1];
    let mut counts = vec![0; edges.len() - 1];
    for &val in data {
        let idx = interior.partition_point(|&e| e <= val);
        counts[idx] += 1;
    }
    counts
}

/// Population Stability Index of `current` against `baseline`, binned on
/// the baseline's quantile breakpoints.
///
/// Returns 0.0 when the baseline yields fewer than 3 distinct breakpoints.
pub fn population_stability_index(baseline: &[f64], current: &[f64], bins: usize) -> f64 {
    if baseline.is_empty() || current.is_empty() {
        return 0.0;
    }

    let edges = quantile_breakpoints(&sorted(baseline), bins);
    if edges.len() < 3 {
        return 0.0;
    }

    let baseline_counts = bin_counts(baseline, &edges);
    let current_counts = bin_counts(current, &edges);
    let total_baseline = baseline.len() as f64;
    let total_current = current.len() as f64;

    baseline_counts
        .iter()
        .zip(current_counts.iter())
        .map(|(&b, &c)| {
            let b_pct = (b as f64 / total_baseline).max(PSI_EPSILON);
            let c_pct = (c as f64 / total_current).max(PSI_EPSILON);
            (c_pct - b_pct) * (c_pct / b_pct).ln()
        })
        .sum()
}

/// Reproducibly downsample to at most `cap` values without replacement.
pub fn downsample(values: &[f64], cap: usize, seed: u64) -> Vec<f64> {
    if values.len() <= cap {
        return values.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, values.len(), cap).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| values[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ks_statistic_identical() {
        let a: Vec<f64> = (0..50).map(f64::from).collect();
        assert_eq!(ks_statistic(&a, &a), 0.0);
    }

    #[test]
    fn test_ks_statistic_disjoint() {
        let a: Vec<f64> = (0..50).map(f64::from).collect();
        let b: Vec<f64> = (100..150).map(f64::from).collect();
        assert_relative_eq!(ks_statistic(&a, &b), 1.0);
    }

    #[test]
    fn test_ks_statistic_ties_not_inflated() {
        let a = vec![1.0, 1.0, 2.0, 2.0];
        let b = vec![1.0, 2.0];
        assert_eq!(ks_statistic(&a, &b), 0.0);
    }

    #[test]
    fn test_ks_statistic_half_shift() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![3.0, 4.0, 5.0, 6.0];
        assert_relative_eq!(ks_statistic(&a, &b), 0.5);
    }

    #[test]
    fn test_ks_p_value_bounds() {
        assert_eq!(ks_p_value(0.0), 1.0);
        assert_eq!(ks_p_value(0.1), 1.0);
        assert!(ks_p_value(3.0) < 1e-6);
        // Q(1.36) is the classic 5% critical value
        assert_relative_eq!(ks_p_value(1.36), 0.05, epsilon = 2e-3);
    }

    #[test]
    fn test_ks_p_value_monotone() {
        let mut prev = 1.0;
        for i in 3..40 {
            let p = ks_p_value(f64::from(i) * 0.1);
            assert!(p <= prev + 1e-12);
            prev = p;
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        let s = vec![0.0, 10.0];
        assert_relative_eq!(quantile(&s, 0.25), 2.5);
        assert_relative_eq!(quantile(&s, 1.0), 10.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_breakpoints_collapse_duplicates() {
        let s = vec![1.0; 100];
        assert_eq!(quantile_breakpoints(&s, 10), vec![1.0]);

        let s: Vec<f64> = (0..=10).map(f64::from).collect();
        assert_eq!(quantile_breakpoints(&s, 10).len(), 11);
    }

    #[test]
    fn test_bin_counts_open_outer_edges() {
        let edges = vec![0.0, 5.0, 10.0];
        let counts = bin_counts(&[-100.0, 0.0, 4.9, 5.0, 10.0, 1000.0], &edges);
        assert_eq!(counts, vec![3, 3]);
    }

    #[test]
    fn test_psi_identical_is_zero() {
        let a: Vec<f64> = (0..200).map(|i| f64::from(i) * 0.5).collect();
        assert_eq!(population_stability_index(&a, &a, 10), 0.0);
    }

    #[test]
    fn test_psi_degenerate_baseline() {
        let a = vec![3.0; 100];
        let b: Vec<f64> = (0..100).map(f64::from).collect();
        assert_eq!(population_stability_index(&a, &b, 10), 0.0);
    }

    #[test]
    fn test_psi_shifted_is_large() {
        let a: Vec<f64> = (0..500).map(|i| f64::from(i) / 500.0).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 0.8).collect();
        assert!(population_stability_index(&a, &b, 10) > 1.0);
    }

    #[test]
    fn test_downsample_reproducible() {
        let values: Vec<f64> = (0..10_000).map(f64::from).collect();
        let a = downsample(&values, 500, 42);
        let b = downsample(&values, 500, 42);
        assert_eq!(a.len(), 500);
        assert_eq!(a, b);

        let mut dedup = a.clone();
        dedup.dedup();
        assert_eq!(dedup.len(), 500);
    }

    #[test]
    fn test_downsample_under_cap_is_identity() {
        let values = vec![3.0, 1.0, 2.0];
        assert_eq!(downsample(&values, 5, 42), values);
    }
}
