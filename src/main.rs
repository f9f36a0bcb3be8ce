//! Vigilar CLI
//!
//! Drift scans and retraining triggers for the vigilar library.
//!
//! # Usage
//!
//! ```bash
//! # One drift scan with the settings in vigilar.yaml
//! vigilar scan
//!
//! # Detect and alert only, JSON output
//! vigilar --config prod.yaml scan --no-retrain --format json
//!
//! # Ad-hoc comparison of two files
//! vigilar compare baseline.parquet current.parquet --feature rsi_14 --entity AAPL
//!
//! # Manual retraining (after an approval request)
//! vigilar retrain AAPL --severity HIGH --features rsi_14,volatility
//!
//! # Validate config
//! vigilar validate --detailed
//! ```

use clap::Parser;
use std::process::ExitCode;
use vigilar::cli::{run_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
