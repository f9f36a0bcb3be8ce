//! Validate command implementation

use std::path::Path;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{ValidateArgs, VigilarConfig};

/// Shown in place of secrets
const REDACTED: &str = "<redacted>";

fn presence(value: Option<&str>) -> &str {
    value.unwrap_or("(not set)")
}

/// Format the effective settings as a string
pub fn format_settings(config: &VigilarConfig) -> String {
    let drift = &config.drift;
    let retraining = &config.retraining;
    [
        format!("  Baseline: {}", config.data.baseline.display()),
        format!("  Current: {}", config.data.current.display()),
        format!("  Features: {}", drift.features.join(", ")),
        format!("  alpha: {}  psi_threshold: {}", drift.alpha, drift.psi_threshold),
        format!(
            "  Lookback: {} days, max {} entities, {} worker(s)",
            drift.lookback_days, drift.max_tickers, drift.workers
        ),
        format!("  Retraining: {}", if retraining.enabled { "enabled" } else { "disabled" }),
        format!("  Retraining API: {}", presence(retraining.base_url.as_deref())),
        format!(
            "  Circuit breaker: {} failures, {}s timeout",
            retraining.circuit_breaker_failure_threshold, retraining.circuit_breaker_timeout_seconds
        ),
        format!("  Min retrain interval: {}h", retraining.min_retrain_interval_hours),
        format!(
            "  Webhook: {}",
            if config.notifications.webhook_url.is_some() { "configured" } else { "(not set)" }
        ),
        format!("  Storage: {} ({})", config.storage.backend, config.storage.path.display()),
    ]
    .join("\n")
}

/// Effective configuration as YAML with secrets replaced
pub fn redacted_yaml(config: &VigilarConfig) -> Result<String, String> {
    let mut config = config.clone();
    if config.retraining.api_key.is_some() {
        config.retraining.api_key = Some(REDACTED.to_string());
    }
    if config.notifications.webhook_url.is_some() {
        config.notifications.webhook_url = Some(REDACTED.to_string());
    }
    serde_yaml::to_string(&config).map_err(|e| format!("Failed to serialize config: {e}"))
}

/// The config was already loaded and validated by the time this runs.
pub fn run_validate(
    path: &Path,
    config: &VigilarConfig,
    args: ValidateArgs,
    level: LogLevel,
) -> Result<(), String> {
    let source = if path.exists() { path.display().to_string() } else { "defaults".to_string() };
    log(level, LogLevel::Normal, &format!("✓ Configuration valid ({source})"));

    if args.detailed {
        log(level, LogLevel::Normal, &redacted_yaml(config)?);
    } else {
        log(level, LogLevel::Normal, &format_settings(config));
    }
    Ok(())
}
