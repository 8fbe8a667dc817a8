//! Build command implementation.
//!
//! The build command:
//! 1. Loads the build plan
//! 2. Turns every plan entry into a conversion job
//! 3. Runs the jobs with bounded parallelism
//! 4. Writes the run summary

use crate::job::{run_job, JobConfig, Scheduler};
use crate::output::{write_json, BuildSummary};
use crate::plan::load_plan;
use crate::utils::config::DEFAULT_MAX_PARALLEL;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the build command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Build plan JSON
    pub plan: PathBuf,

    /// Maximum number of jobs in flight
    pub max_parallel: usize,

    /// Settings shared by every job
    pub job_config: JobConfig,

    /// Output path for the JSON run summary (optional)
    pub summary: Option<PathBuf>,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            plan: PathBuf::from("plan.json"),
            max_parallel: DEFAULT_MAX_PARALLEL,
            job_config: JobConfig::default(),
            summary: None,
        }
    }
}

/// Execute the build command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Build command arguments
///
/// # Returns
/// The run summary, also when some jobs failed. Callers decide how to
/// report failures.
///
/// # Errors
/// * Plan loading errors
/// * Summary write errors
pub fn execute_build(args: BuildArgs) -> Result<BuildSummary> {
    let start_time = Instant::now();

    info!("Step 1/3: Loading build plan {}...", args.plan.display());
    let plan = load_plan(&args.plan)
        .with_context(|| format!("Failed to load build plan {}", args.plan.display()))?;
    let jobs = plan.jobs();

    info!(
        "Step 2/3: Running {} jobs (max {} in parallel, {} sources)...",
        jobs.len(),
        args.max_parallel,
        args.job_config.format
    );
    let scheduler = Scheduler::new(args.max_parallel);
    let config = &args.job_config;
    let schedule = scheduler.run(&jobs, |job| run_job(job, config));

    let summary = BuildSummary::new(
        &args.plan,
        scheduler.max_parallel(),
        &schedule,
        start_time.elapsed(),
    );

    info!("Step 3/3: Writing summary...");
    if let Some(path) = &args.summary {
        write_json(&summary, path).context("Failed to write build summary")?;
        info!("✓ Summary written to: {}", path.display());
    }

    for target in &summary.failed {
        warn!("Failed target: {}", target.display());
    }
    info!(
        "Build completed in {:.2}s: {}/{} jobs succeeded",
        summary.elapsed_seconds, summary.succeeded, summary.total
    );

    Ok(summary)
}

/// Validate build arguments
///
/// **Public** - can be called before execute_build for early validation
pub fn validate_build_args(args: &BuildArgs) -> Result<()> {
    if !args.plan.is_file() {
        anyhow::bail!("Build plan not found: {}", args.plan.display());
    }

    if !args.job_config.workspace_root.is_dir() {
        anyhow::bail!(
            "Workspace directory does not exist: {}",
            args.job_config.workspace_root.display()
        );
    }

    Ok(())
}
