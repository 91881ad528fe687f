//! Reading target files and writing synchronization results.
//!
//! Targets are read from JSON or YAML, picked by file extension. Results are written as
//! pretty-printed JSON or as YAML.

use crate::error::{Error, Result};
use crate::model::{ServiceInput, SyncResult};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a synchronization result to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(result: &SyncResult) -> Result<String> {
    debug!("Serializing synchronization result to YAML");
    Ok(serde_yaml::to_string(result)?)
}

/// Serializes a synchronization result to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(result: &SyncResult) -> Result<String> {
    debug!("Serializing synchronization result to JSON");
    Ok(serde_json::to_string_pretty(result)?)
}

/// Reads the services to synchronize from a `.json`, `.yaml` or `.yml` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has another extension, or does not hold
/// a list of services.
pub fn load_services(path: &Path) -> Result<Vec<ServiceInput>> {
    debug!("Loading targets from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let services: Vec<ServiceInput> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "targets file {} must end in .json, .yaml or .yml",
                path.display()
            )))
        }
    };

    debug!("Loaded {} services", services.len());
    Ok(services)
}

/// Writes string content to a file.
///
/// Creates the file and its parent directories if they don't exist, or overwrites the
/// file if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
