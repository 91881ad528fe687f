//! api-doc-sync - Command-line tool for synchronizing API metadata with source code.
//!
//! Reads a list of services and their target files, discovers the API endpoints and
//! types declared next to those files, and prints the filled-in records.
//!
//! # Usage
//!
//! ```bash
//! api-doc-sync [OPTIONS] --targets <FILE> <APP_ROOT>
//! ```
//!
//! # Examples
//!
//! Print the result as JSON:
//! ```bash
//! api-doc-sync ./my-app --targets targets.yaml
//! ```
//!
//! Write YAML to a file with verbose logging:
//! ```bash
//! api-doc-sync ./my-app -t targets.json -f yaml -o api.yaml -v
//! ```

use anyhow::Result;
use api_doc_sync::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("api-doc-sync starting...");

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    info!("Synchronization completed");

    Ok(())
}
