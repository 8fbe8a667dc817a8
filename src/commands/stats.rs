//! Statistics command implementations (`refcount` and `streams`).

use crate::output::{to_json_string, write_csv_lines, write_json};
use crate::stats::{compute_refcounts, compute_stream_skewness, RefcountReport, StatsOptions, StreamReport};
use crate::utils::config::DEFAULT_STATS_KEY_WIDTH;
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

/// Arguments shared by the statistics commands
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct StatsArgs {
    /// Canonical traces to scan
    pub traces: Vec<PathBuf>,

    /// Output path for the CSV histogram
    pub output: PathBuf,

    /// Output path for the JSON summary (refcount only, optional)
    pub summary: Option<PathBuf>,

    /// Fingerprint bytes used as chunk key
    pub key_width: usize,

    /// Only consider traced files ending with this suffix
    pub suffix: Option<String>,
}

impl Default for StatsArgs {
    fn default() -> Self {
        Self {
            traces: Vec::new(),
            output: PathBuf::from("out.csv"),
            summary: None,
            key_width: DEFAULT_STATS_KEY_WIDTH,
            suffix: None,
        }
    }
}

impl StatsArgs {
    fn options(&self) -> Result<StatsOptions> {
        Ok(StatsOptions::new(self.key_width, self.suffix.clone())?)
    }
}

/// Validate statistics arguments
///
/// **Public** - every trace must be an existing regular file
pub fn validate_stats_args(args: &StatsArgs) -> Result<()> {
    if args.traces.is_empty() {
        anyhow::bail!("Found no input trace in the given list");
    }

    for trace in &args.traces {
        let meta = std::fs::metadata(trace)
            .with_context(|| format!("Cannot access trace {}", trace.display()))?;
        if !meta.is_file() {
            anyhow::bail!("Input trace is not a regular file: {}", trace.display());
        }
    }

    Ok(())
}

/// Execute the refcount command
///
/// **Public** - main entry point called from main.rs
pub fn execute_refcount(args: StatsArgs) -> Result<RefcountReport> {
    validate_stats_args(&args)?;
    let options = args.options()?;

    let report = compute_refcounts(&args.traces, &options).context("Failed to compute refcounts")?;
    info!("Results: {}", to_json_string(&report.summary)?);

    write_csv_lines(&report.csv_lines(), &args.output).context("Failed to write refcount histogram")?;
    info!("✓ Histogram written to: {}", args.output.display());

    if let Some(path) = &args.summary {
        write_json(&report.summary, path).context("Failed to write refcount summary")?;
        info!("✓ Summary written to: {}", path.display());
    }

    Ok(report)
}

/// Execute the streams command
///
/// **Public** - main entry point called from main.rs
pub fn execute_streams(args: StatsArgs) -> Result<StreamReport> {
    validate_stats_args(&args)?;
    let options = args.options()?;

    let report = compute_stream_skewness(&args.traces, &options)
        .context("Failed to compute stream skewness")?;

    write_csv_lines(&report.csv_lines(), &args.output)
        .context("Failed to write stream histogram")?;
    info!("✓ Histogram written to: {}", args.output.display());

    Ok(report)
}
