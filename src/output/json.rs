//! JSON output writer.
//!
//! Writes build and statistics summaries to JSON files with pretty formatting.

use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write any serializable summary to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `value` - Data to write
/// * `output_path` - Path to output JSON file
///
/// # Returns
/// Ok if file written successfully
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let summary = BuildSummary::new(&plan_path, 8, &schedule, elapsed);
/// write_json(&summary, "summary.json")?;
/// ```
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing summary to: {}", output_path.display());

    validate_output_path(output_path)?;
    prepare_output_path(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(OutputError::SerializationFailed)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    debug!(
        "Summary written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize to a pretty JSON string (for printing to stdout)
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, OutputError> {
    serde_json::to_string_pretty(value).map_err(OutputError::SerializationFailed)
}

/// Validate that output path is writable
///
/// **Private** - shared with the CSV writer
pub(crate) fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create missing parent directories
///
/// **Private** - shared with the CSV writer
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
