//! Summary of a `build` run as written to disk.

use crate::job::ScheduleSummary;
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Machine-readable outcome of building a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Summary schema version
    pub version: String,

    /// Plan the jobs came from
    pub plan: PathBuf,

    pub max_parallel: usize,
    pub total: usize,
    pub succeeded: usize,

    /// Targets of failed jobs
    pub failed: Vec<PathBuf>,

    pub elapsed_seconds: f64,

    /// RFC 3339 timestamp
    pub generated_at: String,
}

impl BuildSummary {
    /// Assemble a summary from a finished schedule
    pub fn new(
        plan: impl AsRef<Path>,
        max_parallel: usize,
        schedule: &ScheduleSummary,
        elapsed: Duration,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            plan: plan.as_ref().to_path_buf(),
            max_parallel,
            total: schedule.total,
            succeeded: schedule.succeeded,
            failed: schedule.failed.clone(),
            elapsed_seconds: elapsed.as_secs_f64(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}
