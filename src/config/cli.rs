//! Command line definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::eval::drift::Severity;

/// Vigilar: feature drift detection with guarded auto-retraining
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "vigilar")]
#[command(version)]
#[command(about = "Feature drift detection (KS + PSI) with guarded auto-retraining")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to the YAML configuration (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "vigilar.yaml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run one drift scan over the configured datasets
    Scan(ScanArgs),

    /// Compare two dataset files ad hoc
    Compare(CompareArgs),

    /// Manually trigger retraining for an entity
    Retrain(RetrainArgs),

    /// Validate the configuration and print the effective settings
    Validate(ValidateArgs),
}

/// Arguments for the scan command
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct ScanArgs {
    /// Baseline dataset (overrides data.baseline)
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Current dataset (overrides data.current)
    #[arg(long)]
    pub current: Option<PathBuf>,

    /// Detect and alert only; never call the retraining service
    #[arg(long)]
    pub no_retrain: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the compare command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct CompareArgs {
    /// Baseline dataset file
    pub baseline: PathBuf,

    /// Current dataset file
    pub current: PathBuf,

    /// Feature column to compare (repeatable)
    #[arg(long = "feature", required = true)]
    pub features: Vec<String>,

    /// Restrict both datasets to one entity
    #[arg(long)]
    pub entity: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the retrain command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RetrainArgs {
    /// Entity to retrain
    pub entity: String,

    /// Drift severity recorded on the job
    #[arg(long, default_value = "HIGH")]
    pub severity: Severity,

    /// Comma-separated drifted features recorded on the job
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct ValidateArgs {
    /// Print the full effective configuration as YAML
    #[arg(short, long)]
    pub detailed: bool,
}

/// Output format for scan and compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
