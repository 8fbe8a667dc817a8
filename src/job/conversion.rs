//! A single conversion job: many source traces, one canonical target.

use super::decompress::Decompressor;
use super::pipeline::{decode_into, PipelineError, SourceStats};
use crate::codec::{validate_stream, RecordWriter};
use crate::decoder::{open_decoder, SourceFormat};
use crate::utils::config::WORKSPACE_PREFIX;
use crate::utils::error::{CodecError, JobError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;

/// Settings shared by every job of a run
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Encoding of the source files
    pub format: SourceFormat,

    /// How sources are unpacked in the workspace
    pub decompressor: Decompressor,

    /// Directory under which job workspaces are created
    pub workspace_root: PathBuf,

    /// Re-walk every target after writing it
    pub verify_output: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            format: SourceFormat::Ubc,
            decompressor: Decompressor::Gzip,
            workspace_root: std::env::temp_dir(),
            verify_output: false,
        }
    }
}

/// Sources merged, in sorted order, into one target file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionJob {
    pub source_files: Vec<PathBuf>,
    pub target_file: PathBuf,
}

/// What a successful job produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub target_file: PathBuf,
    pub sources: usize,
    pub files: u64,
    pub chunks: u64,
    pub records: u64,
    pub bytes: u64,
}

impl ConversionJob {
    /// Create a job; sources are sorted so the merge order is deterministic
    pub fn new(mut source_files: Vec<PathBuf>, target_file: impl Into<PathBuf>) -> Self {
        source_files.sort();
        Self {
            source_files,
            target_file: target_file.into(),
        }
    }

    /// Run the job to completion
    ///
    /// **Public** - main entry point for one conversion
    ///
    /// # Arguments
    /// * `config` - Format, decompression and workspace settings
    ///
    /// # Returns
    /// Counters for the written target
    ///
    /// # Errors
    /// Any copy, decompression, decode or write failure aborts the job. The
    /// workspace is removed on every path; the target keeps whatever complete
    /// sources were written before the failure.
    pub fn run(&self, config: &JobConfig) -> Result<JobReport, JobError> {
        let started = Instant::now();

        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&config.workspace_root)
            .map_err(|source| JobError::Workspace {
                path: config.workspace_root.clone(),
                source,
            })?;
        debug!(
            "Job for {} uses workspace {}",
            self.target_file.display(),
            workspace.path().display()
        );

        let result = self.convert_all(workspace.path(), config);
        remove_workspace(workspace);

        let report = result?;
        info!(
            "Wrote {} ({} sources, {} files, {} chunks) in {:.2}s",
            report.target_file.display(),
            report.sources,
            report.files,
            report.chunks,
            started.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Convert every source into the target
    ///
    /// **Private** - the workspace is owned by `run`
    fn convert_all(&self, workspace: &Path, config: &JobConfig) -> Result<JobReport, JobError> {
        let mut writer = self.open_target()?;
        let mut totals = SourceStats::default();

        for source in &self.source_files {
            let stats = self.convert_source(source, workspace, config, &mut writer)?;
            totals.files += stats.files;
            totals.chunks += stats.chunks;
        }

        let records = writer.records_written();
        let bytes = writer.bytes_written();
        writer.finish().map_err(|source| self.write_error(source))?;

        if config.verify_output {
            self.verify(records)?;
        }

        Ok(JobReport {
            target_file: self.target_file.clone(),
            sources: self.source_files.len(),
            files: totals.files,
            chunks: totals.chunks,
            records,
            bytes,
        })
    }

    fn open_target(&self) -> Result<RecordWriter<File>, JobError> {
        let target_error = |source| JobError::Target {
            path: self.target_file.clone(),
            source,
        };

        if let Some(parent) = self.target_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(target_error)?;
            }
        }
        let file = File::create(&self.target_file).map_err(target_error)?;
        Ok(RecordWriter::new(file))
    }

    /// Copy, decompress and decode one source, then drop the intermediate
    fn convert_source(
        &self,
        source: &Path,
        workspace: &Path,
        config: &JobConfig,
        writer: &mut RecordWriter<File>,
    ) -> Result<SourceStats, JobError> {
        let file_name = source.file_name().ok_or_else(|| JobError::Copy {
            from: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
        })?;
        let copy = workspace.join(file_name);
        std::fs::copy(source, &copy).map_err(|e| JobError::Copy {
            from: source.to_path_buf(),
            source: e,
        })?;

        let plain = config.decompressor.decompress_in_place(&copy)?;
        debug!("Will parse {} into {}", plain.display(), self.target_file.display());

        let decoder = open_decoder(config.format, &plain).map_err(|e| JobError::Decode {
            path: plain.clone(),
            source: e,
        })?;

        let outcome = decode_into(decoder, writer);
        // Keep what was decoded so far visible in the target
        let flushed = writer.flush();

        if let Err(e) = std::fs::remove_file(&plain) {
            warn!("Couldn't remove intermediate {}: {}", plain.display(), e);
        }

        let stats = match outcome {
            Ok(stats) => stats,
            Err(PipelineError::Decode(e)) => {
                return Err(JobError::Decode {
                    path: source.to_path_buf(),
                    source: e,
                })
            }
            Err(PipelineError::Write(e)) => return Err(self.write_error(e)),
            Err(PipelineError::DecoderPanicked) => {
                return Err(JobError::DecoderPanicked(source.to_path_buf()))
            }
        };
        flushed.map_err(|e| self.write_error(e))?;

        debug!(
            "{}: {} files, {} chunks",
            source.display(),
            stats.files,
            stats.chunks
        );
        Ok(stats)
    }

    /// Re-read the finished target and compare record counts
    fn verify(&self, expected_records: u64) -> Result<(), JobError> {
        let summary = validate_stream(&self.target_file).map_err(|e| JobError::Verify {
            path: self.target_file.clone(),
            reason: e.to_string(),
        })?;

        if summary.records != expected_records {
            return Err(JobError::Verify {
                path: self.target_file.clone(),
                reason: format!(
                    "wrote {} records but read back {}",
                    expected_records, summary.records
                ),
            });
        }
        debug!("Verified {} ({} records)", self.target_file.display(), summary.records);
        Ok(())
    }

    fn write_error(&self, source: CodecError) -> JobError {
        JobError::Write {
            path: self.target_file.clone(),
            source,
        }
    }
}

/// Remove a workspace, logging instead of failing
fn remove_workspace(workspace: TempDir) {
    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        warn!("Couldn't remove temporary directory {}: {}", path.display(), e);
    }
}

/// Run `job` and collapse the outcome into success or failure
///
/// **Public** - the runner handed to the scheduler
pub fn run_job(job: &ConversionJob, config: &JobConfig) -> bool {
    match job.run(config) {
        Ok(_) => true,
        Err(e) => {
            error!("Job for {} failed: {}", job.target_file.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_sources() {
        let job = ConversionJob::new(
            vec![PathBuf::from("/data/b.gz"), PathBuf::from("/data/a.gz")],
            "/out/gen_0_stream0",
        );
        assert_eq!(
            job.source_files,
            vec![PathBuf::from("/data/a.gz"), PathBuf::from("/data/b.gz")]
        );
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["source_files"][0], "/data/a.gz");
    }
}
