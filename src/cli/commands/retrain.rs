//! Retrain command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{RetrainArgs, VigilarConfig};
use crate::retrain::RetrainOutcome;
use crate::scan::Runtime;

/// Manual trigger. The operator stands in for the approval gate; the
/// rate limiter and circuit breaker still apply.
pub fn run_retrain(
    config: &VigilarConfig,
    args: RetrainArgs,
    level: LogLevel,
) -> Result<(), String> {
    let runtime = Runtime::from_config(config, false).map_err(|e| e.to_string())?;
    let outcome = runtime.coordinator.trigger_manual(&args.entity, args.severity, args.features);

    match outcome {
        RetrainOutcome::Failed { error } => {
            Err(format!("Retraining {} failed: {error}", args.entity))
        }
        other => {
            log(level, LogLevel::Normal, &format!("Retraining {}: {other}", args.entity));
            Ok(())
        }
    }
}
