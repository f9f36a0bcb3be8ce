//! Scan command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{OutputFormat, ScanArgs, VigilarConfig};
use crate::data::FileDataset;
use crate::scan::{Runtime, ScanSummary};

/// Format a scan summary for the terminal
pub fn format_summary(summary: &ScanSummary) -> String {
    let mut lines = vec![
        format!("Drift scan: {} ({:.2}s)", summary.status, summary.duration_seconds),
        format!("  Entities evaluated: {}", summary.tickers_evaluated),
        format!("  Entities with drift: {}", summary.tickers_with_drift),
        format!("  Alerts created: {}", summary.alerts_created),
        format!("  Retraining triggered: {}", summary.retraining_triggered),
    ];

    for report in summary.drifted() {
        let features = report.drifted_feature_names().join(", ");
        lines.push(format!(
            "  {:<8} {:<8} score {:.3}  [{features}]",
            report.entity_id, report.severity, report.avg_drift_score
        ));
        if let Some(outcome) = summary.retrain_outcomes.get(&report.entity_id) {
            lines.push(format!("           retraining: {outcome}"));
        }
    }
    lines.join("\n")
}

pub fn run_scan(config: &VigilarConfig, args: ScanArgs, level: LogLevel) -> Result<(), String> {
    let mut config = config.clone();
    if let Some(baseline) = args.baseline {
        config.data.baseline = baseline;
    }
    if let Some(current) = args.current {
        config.data.current = current;
    }

    let runtime = Runtime::from_config(&config, !args.no_retrain).map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Scanning {} against {}",
            config.data.current.display(),
            config.data.baseline.display()
        ),
    );

    let summary = runtime.orchestrator.scan(
        &FileDataset::new(&config.data.baseline),
        &FileDataset::new(&config.data.current),
    );

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| format!("Failed to serialize scan summary: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Text => log(level, LogLevel::Normal, &format_summary(&summary)),
    }
    Ok(())
}
