//! Compare command implementation

use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{CompareArgs, OutputFormat, VigilarConfig};
use crate::data::{DatasetSource, FeatureFrame, FileDataset};
use crate::eval::drift::EntityDriftReport;

/// Label used when the comparison is not restricted to one entity
const ALL_ENTITIES: &str = "*";

fn load_frame(path: &Path) -> Result<FeatureFrame, String> {
    FileDataset::new(path)
        .load()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Dataset not found: {}", path.display()))
}

fn restrict(frame: FeatureFrame, entity_column: &str, entity: Option<&str>) -> FeatureFrame {
    match entity {
        Some(id) => {
            let rows = frame.group_rows(entity_column).remove(id).unwrap_or_default();
            frame.take(&rows)
        }
        None => frame,
    }
}

/// Format a comparison report as a table
pub fn format_report(report: &EntityDriftReport, requested: &[String]) -> String {
    let mut lines = vec![format!(
        "{:<16} {:>9} {:>10} {:>8} {:>7} {:<9} drift",
        "feature", "statistic", "p_value", "psi", "score", "severity"
    )];
    for (feature, m) in &report.per_feature {
        lines.push(format!(
            "{feature:<16} {:>9.4} {:>10.3e} {:>8.4} {:>7.3} {:<9} {}",
            m.statistic,
            m.p_value,
            m.psi,
            m.drift_score,
            m.severity,
            if m.drifted() { "yes" } else { "no" }
        ));
    }

    let skipped: Vec<&str> = requested
        .iter()
        .filter(|f| !report.per_feature.contains_key(*f))
        .map(String::as_str)
        .collect();
    if !skipped.is_empty() {
        lines.push(format!("Skipped (missing or too few samples): {}", skipped.join(", ")));
    }
    lines.push(format!(
        "Overall: {} (avg score {:.3})",
        report.severity, report.avg_drift_score
    ));
    lines.join("\n")
}

pub fn run_compare(
    config: &VigilarConfig,
    args: CompareArgs,
    level: LogLevel,
) -> Result<(), String> {
    let entity_column = config.data.entity_column.as_str();
    let baseline = restrict(load_frame(&args.baseline)?, entity_column, args.entity.as_deref());
    let current = restrict(load_frame(&args.current)?, entity_column, args.entity.as_deref());

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Comparing {} baseline rows against {} current rows",
            baseline.len(),
            current.len()
        ),
    );

    let evaluator = config.drift.evaluator();
    let label = args.entity.as_deref().unwrap_or(ALL_ENTITIES);
    let per_feature: BTreeMap<_, _> =
        evaluator.evaluate(label, &args.features, &baseline, &current);
    let report = evaluator.report(label, per_feature);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Text => log(level, LogLevel::Normal, &format_report(&report, &args.features)),
    }
    Ok(())
}
