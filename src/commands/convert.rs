//! Convert command implementation.
//!
//! Runs a single conversion job outside of any plan: every given source is
//! merged, in sorted order, into one canonical target.

use crate::job::{ConversionJob, JobConfig, JobReport};
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

/// Arguments for the convert command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Source traces
    pub sources: Vec<PathBuf>,

    /// Canonical output file
    pub target: PathBuf,

    pub job_config: JobConfig,
}

/// Execute the convert command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * No sources given
/// * Any job failure (copy, decompression, decoding or write)
pub fn execute_convert(args: ConvertArgs) -> Result<JobReport> {
    if args.sources.is_empty() {
        anyhow::bail!("At least one source file is required");
    }

    let job = ConversionJob::new(args.sources, args.target);
    info!(
        "Converting {} {} sources into {}",
        job.source_files.len(),
        args.job_config.format,
        job.target_file.display()
    );

    let report = job
        .run(&args.job_config)
        .with_context(|| format!("Failed to build {}", job.target_file.display()))?;

    info!("✓ Target written to: {}", report.target_file.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_requires_sources() {
        let args = ConvertArgs {
            target: PathBuf::from("out.trace"),
            ..Default::default()
        };
        assert!(execute_convert(args).is_err());
    }
}
