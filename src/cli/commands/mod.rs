//! CLI command implementations

mod compare;
mod retrain;
mod scan;
mod validate;


use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::{load_config, Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);
    init_tracing(log_level);

    let config = load_config(&cli.config).map_err(|e| format!("[{}] {e}", e.code()))?;

    match cli.command {
        Command::Scan(args) => scan::run_scan(&config, args, log_level),
        Command::Compare(args) => compare::run_compare(&config, args, log_level),
        Command::Retrain(args) => retrain::run_retrain(&config, args, log_level),
        Command::Validate(args) => validate::run_validate(&cli.config, &config, args, log_level),
    }
}
