//! Configuration validation

use thiserror::Error;

use super::schema::VigilarConfig;

/// Tolerance on the KS + PSI weight sum
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Longest lookback window accepted (100 years)
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Longest initial retry backoff accepted
pub const MAX_BACKOFF_SECONDS: f64 = 3600.0;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid alpha: {0} (must be > 0.0 and < 1.0)")]
    InvalidAlpha(f64),

    #[error("Invalid psi_threshold: {0} (must be >= 0.0)")]
    InvalidPsiThreshold(f64),

    #[error("No drift features configured (drift.features must list at least one column)")]
    NoFeatures,

    #[error("Empty column name: {0}")]
    EmptyColumn(&'static str),

    #[error("Invalid {0}: 0 (must be > 0)")]
    Zero(&'static str),

    #[error("Invalid bins: {0} (must be >= 2)")]
    InvalidBins(usize),

    #[error("Invalid min_samples: {0} (must be >= 2)")]
    InvalidMinSamples(usize),

    #[error("Invalid drift weights: ks + psi = {0} (must sum to 1.0)")]
    InvalidWeights(f64),

    #[error("Invalid psi_saturation: {0} (must be > 0.0)")]
    InvalidPsiSaturation(f64),

    #[error(
        "Invalid severity cutoffs: medium={medium}, high={high}, critical={critical} \
         (must satisfy 0 < medium < high < critical <= 1)"
    )]
    InvalidSeverityCutoffs { medium: f64, high: f64, critical: f64 },

    #[error("Invalid {name}: {value} (must be >= 0.0)")]
    Negative { name: &'static str, value: f64 },

    #[error("Invalid {name}: {value} (must be <= {max})")]
    TooLarge { name: &'static str, value: f64, max: f64 },

    #[error("Invalid sample_size: {sample_size} (must be >= min_samples = {min_samples})")]
    SampleSizeBelowMinimum { sample_size: usize, min_samples: usize },
}

/// NaN fails
fn is_non_negative(value: f64) -> bool {
    value >= 0.0
}

/// Validate a configuration.
///
/// Checks run in section order and stop at the first problem.
pub fn validate_config(config: &VigilarConfig) -> Result<(), ValidationError> {
    let data = &config.data;
    if data.entity_column.trim().is_empty() {
        return Err(ValidationError::EmptyColumn("data.entity_column"));
    }
    if data.timestamp_column.trim().is_empty() {
        return Err(ValidationError::EmptyColumn("data.timestamp_column"));
    }

    let drift = &config.drift;
    if drift.alpha.is_nan() || drift.alpha <= 0.0 || drift.alpha >= 1.0 {
        return Err(ValidationError::InvalidAlpha(drift.alpha));
    }
    if !is_non_negative(drift.psi_threshold) {
        return Err(ValidationError::InvalidPsiThreshold(drift.psi_threshold));
    }
    if drift.features.is_empty() {
        return Err(ValidationError::NoFeatures);
    }
    if drift.lookback_days == 0 {
        return Err(ValidationError::Zero("drift.lookback_days"));
    }
    if drift.lookback_days > MAX_LOOKBACK_DAYS {
        return Err(ValidationError::TooLarge {
            name: "drift.lookback_days",
            value: f64::from(drift.lookback_days),
            max: f64::from(MAX_LOOKBACK_DAYS),
        });
    }
    if drift.max_tickers == 0 {
        return Err(ValidationError::Zero("drift.max_tickers"));
    }
    if drift.sample_size == 0 {
        return Err(ValidationError::Zero("drift.sample_size"));
    }
    if drift.workers == 0 {
        return Err(ValidationError::Zero("drift.workers"));
    }
    if drift.bins < 2 {
        return Err(ValidationError::InvalidBins(drift.bins));
    }
    if drift.min_samples < 2 {
        return Err(ValidationError::InvalidMinSamples(drift.min_samples));
    }
    if drift.sample_size < drift.min_samples {
        return Err(ValidationError::SampleSizeBelowMinimum {
            sample_size: drift.sample_size,
            min_samples: drift.min_samples,
        });
    }

    let weights = &drift.weights;
    if weights.ks < 0.0 || weights.psi < 0.0 {
        return Err(ValidationError::InvalidWeights(weights.ks + weights.psi));
    }
    let sum = weights.ks + weights.psi;
    if sum.is_nan() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ValidationError::InvalidWeights(sum));
    }
    if weights.psi_saturation.is_nan() || weights.psi_saturation <= 0.0 {
        return Err(ValidationError::InvalidPsiSaturation(weights.psi_saturation));
    }

    let cutoffs = &drift.severity;
    let ordered = 0.0 < cutoffs.medium
        && cutoffs.medium < cutoffs.high
        && cutoffs.high < cutoffs.critical
        && cutoffs.critical <= 1.0;
    if !ordered {
        return Err(ValidationError::InvalidSeverityCutoffs {
            medium: cutoffs.medium,
            high: cutoffs.high,
            critical: cutoffs.critical,
        });
    }

    let retraining = &config.retraining;
    if retraining.timeout_seconds == 0 {
        return Err(ValidationError::Zero("retraining.timeout_seconds"));
    }
    if retraining.circuit_breaker_failure_threshold == 0 {
        return Err(ValidationError::Zero("retraining.circuit_breaker_failure_threshold"));
    }
    if retraining.circuit_breaker_timeout_seconds == 0 {
        return Err(ValidationError::Zero("retraining.circuit_breaker_timeout_seconds"));
    }
    if !is_non_negative(retraining.backoff_seconds) {
        return Err(ValidationError::Negative {
            name: "retraining.backoff_seconds",
            value: retraining.backoff_seconds,
        });
    }
    if retraining.backoff_seconds > MAX_BACKOFF_SECONDS {
        return Err(ValidationError::TooLarge {
            name: "retraining.backoff_seconds",
            value: retraining.backoff_seconds,
            max: MAX_BACKOFF_SECONDS,
        });
    }
    if !is_non_negative(retraining.min_retrain_interval_hours) {
        return Err(ValidationError::Negative {
            name: "retraining.min_retrain_interval_hours",
            value: retraining.min_retrain_interval_hours,
        });
    }

    if config.notifications.timeout_seconds == 0 {
        return Err(ValidationError::Zero("notifications.timeout_seconds"));
    }

    Ok(())
}
