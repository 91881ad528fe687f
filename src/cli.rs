use crate::serializer::{load_services, serialize_json, serialize_yaml, write_to_file};
use crate::sync::Synchronizer;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Synchronize API endpoint metadata with the source code of a Rust application
#[derive(Parser, Debug)]
#[command(name = "api-doc-sync")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Root directory of the application
    #[arg(value_name = "APP_ROOT")]
    pub app_root: PathBuf,

    /// JSON or YAML file listing the services and target files to synchronize
    #[arg(short = 't', long = "targets", value_name = "FILE")]
    pub targets: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Validate and log already-parsed arguments
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.app_root.is_dir() {
        anyhow::bail!(
            "Application root is not a directory: {}",
            args.app_root.display()
        );
    }
    if !args.targets.is_file() {
        anyhow::bail!("Targets file does not exist: {}", args.targets.display());
    }

    info!("Application root: {}", args.app_root.display());
    info!("Targets file: {}", args.targets.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Run a synchronization and write its result
pub fn run(args: CliArgs) -> Result<()> {
    let services = load_services(&args.targets)
        .with_context(|| format!("Failed to load targets from {}", args.targets.display()))?;
    let target_count: usize = services.iter().map(|s| s.targets.len()).sum();
    info!(
        "Loaded {} services with {} targets",
        services.len(),
        target_count
    );

    let result = Synchronizer::new(&args.app_root).run(services);
    for error in &result.errors {
        warn!("{}", error);
    }

    let content = match args.output_format {
        OutputFormat::Json => serialize_json(&result)?,
        OutputFormat::Yaml => serialize_yaml(&result)?,
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Wrote synchronization result to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Summary:");
    info!("  - Services: {}", result.services.len());
    info!("  - Targets: {}", target_count);
    info!("  - Diagnostics: {}", result.errors.len());

    Ok(())
}
