//! Conversion jobs and their scheduling.
//!
//! This module handles:
//! - Per-job workspaces and source decompression
//! - Streaming each source through a decoder into the target writer
//! - Running many jobs with bounded parallelism

pub mod conversion;
pub mod decompress;
pub mod pipeline;
pub mod scheduler;

// Re-export main types
pub use conversion::{run_job, ConversionJob, JobConfig, JobReport};
pub use decompress::Decompressor;
pub use pipeline::{decode_into, SourceStats};
pub use scheduler::{ScheduleSummary, Scheduler};
