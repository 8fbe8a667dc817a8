//! Plain CSV histogram output.

use super::json::{prepare_output_path, validate_output_path};
use crate::utils::error::OutputError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write pre-formatted CSV lines, one per row, truncating `output_path`
///
/// **Public** - used for the skewness histograms
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty, a directory, or its parent
///   cannot be created
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_csv_lines<S: AsRef<str>>(lines: &[S], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    validate_output_path(output_path)?;
    prepare_output_path(output_path)?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", lines.len(), output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/refs.csv");
        write_csv_lines(&["1,1", "2,3"], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,1\n2,3\n");
    }

    #[test]
    fn test_write_csv_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.csv");
        std::fs::write(&path, "old content that is long\n").unwrap();
        let empty: [&str; 0] = [];
        write_csv_lines(&empty, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
