//! Validate command implementation.

use crate::codec::{validate_stream, StreamSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Walk a canonical file and print its totals
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * The file cannot be read or is not a well-formed canonical stream
pub fn execute_validate(file_path: &Path) -> Result<StreamSummary> {
    println!("Validating canonical trace: {}", file_path.display());

    let summary = validate_stream(file_path)
        .with_context(|| format!("{} is not a valid canonical trace", file_path.display()))?;

    println!("✓ Valid canonical trace");
    println!("  Files:   {}", summary.files);
    println!("  Chunks:  {}", summary.chunks);
    println!("  Records: {}", summary.records);
    println!("  Bytes:   {}", summary.bytes);

    Ok(summary)
}
