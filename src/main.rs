//! Dedup Trace CLI
//!
//! Builds canonical chunk traces from raw per-host dumps and computes chunk
//! statistics over them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dedup_trace_tools::commands::{
    display_version, execute_build, execute_convert, execute_refcount, execute_streams,
    execute_validate, validate_build_args, BuildArgs, ConvertArgs, StatsArgs,
};
use dedup_trace_tools::decoder::SourceFormat;
use dedup_trace_tools::job::{Decompressor, JobConfig};
use dedup_trace_tools::utils::config::{DEFAULT_MAX_PARALLEL, DEFAULT_STATS_KEY_WIDTH};
use env_logger::Env;
use std::path::PathBuf;

/// Dedup Trace - canonical chunk trace generation
#[derive(Parser, Debug)]
#[command(name = "dedup-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by `build` and `convert`
#[derive(clap::Args, Debug)]
struct JobOptions {
    /// Encoding of the source traces
    #[arg(long, value_enum, default_value_t = SourceFormat::Ubc)]
    format: SourceFormat,

    /// How compressed sources are unpacked
    #[arg(long, value_enum, default_value_t = Decompressor::Gzip)]
    decompressor: Decompressor,

    /// Directory for per-job temporary workspaces
    #[arg(long, env = "DEDUP_TRACE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Re-read every target after writing it
    #[arg(long)]
    verify: bool,
}

impl JobOptions {
    fn into_config(self) -> JobConfig {
        let defaults = JobConfig::default();
        JobConfig {
            format: self.format,
            decompressor: self.decompressor,
            workspace_root: self.workspace.unwrap_or(defaults.workspace_root),
            verify_output: self.verify,
        }
    }
}

/// Options shared by the statistics commands
#[derive(clap::Args, Debug)]
struct StatsOptionsArgs {
    /// Comma-separated list of canonical traces
    #[arg(long, value_delimiter = ',', required = true)]
    traces: Vec<PathBuf>,

    /// Output path for the CSV histogram
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Fingerprint bytes used as chunk key
    #[arg(long, default_value_t = DEFAULT_STATS_KEY_WIDTH)]
    key_width: usize,

    /// Only consider traced files whose name ends with this suffix
    #[arg(long)]
    suffix: Option<String>,
}

impl StatsOptionsArgs {
    fn into_args(self, summary: Option<PathBuf>) -> StatsArgs {
        StatsArgs {
            traces: self.traces,
            output: self.out,
            summary,
            key_width: self.key_width,
            suffix: self.suffix,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every target of a build plan
    Build {
        /// Build plan JSON
        #[arg(short, long)]
        plan: PathBuf,

        /// Maximum number of jobs in flight
        #[arg(long, env = "DEDUP_TRACE_MAX_PARALLEL", default_value_t = DEFAULT_MAX_PARALLEL)]
        max_parallel: usize,

        /// Output path for the JSON run summary
        #[arg(long)]
        summary: Option<PathBuf>,

        #[command(flatten)]
        job: JobOptions,
    },

    /// Convert source traces into one canonical target
    Convert {
        /// Canonical output file
        #[arg(short, long)]
        target: PathBuf,

        #[command(flatten)]
        job: JobOptions,

        /// Source traces, merged in sorted order
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Validate a canonical trace
    Validate {
        /// Path to canonical trace
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Histogram of how many chunks occur exactly N times
    Refcount {
        #[command(flatten)]
        stats: StatsOptionsArgs,

        /// Output path for the JSON summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Histogram of how many chunks occur in exactly N streams
    Streams {
        #[command(flatten)]
        stats: StatsOptionsArgs,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Build {
            plan,
            max_parallel,
            summary,
            job,
        } => {
            let args = BuildArgs {
                plan,
                max_parallel,
                job_config: job.into_config(),
                summary,
            };

            // Validate args first
            validate_build_args(&args)?;

            let summary = execute_build(args)?;
            if summary.failed_count() > 0 {
                anyhow::bail!(
                    "{} of {} jobs failed",
                    summary.failed_count(),
                    summary.total
                );
            }
        }

        Commands::Convert {
            target,
            job,
            sources,
        } => {
            execute_convert(ConvertArgs {
                sources,
                target,
                job_config: job.into_config(),
            })?;
        }

        Commands::Validate { file } => {
            execute_validate(&file)?;
        }

        Commands::Refcount { stats, summary } => {
            execute_refcount(stats.into_args(summary))?;
        }

        Commands::Streams { stats } => {
            execute_streams(stats.into_args(None))?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
