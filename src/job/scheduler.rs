//! Bounded-parallelism job scheduler.
//!
//! Jobs are started in plan order while fewer than `max_parallel` are in
//! flight. At the cap the scheduler waits for exactly one completion before
//! starting the next job, then drains the remaining completions at the end.

use super::conversion::ConversionJob;
use crossbeam::channel::unbounded;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;

/// Outcome of a scheduled run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Targets of failed jobs, sorted
    pub failed: Vec<PathBuf>,
}

impl ScheduleSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs conversion jobs with at most `max_parallel` in flight
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    max_parallel: usize,
}

impl Scheduler {
    /// Create a scheduler; a cap of zero is raised to one
    pub fn new(max_parallel: usize) -> Self {
        if max_parallel == 0 {
            warn!("max parallel jobs must be at least 1, using 1");
        }
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Run every job through `runner` and wait for all of them
    ///
    /// **Public** - main entry point of the `build` command
    ///
    /// # Arguments
    /// * `jobs` - Jobs in start order
    /// * `runner` - Executes one job, returning `true` on success
    ///
    /// # Returns
    /// Totals and the targets of failed jobs. A runner that panics counts as
    /// a failure; the other jobs are unaffected.
    pub fn run<F>(&self, jobs: &[ConversionJob], runner: F) -> ScheduleSummary
    where
        F: Fn(&ConversionJob) -> bool + Sync,
    {
        let mut summary = ScheduleSummary {
            total: jobs.len(),
            ..Default::default()
        };
        let runner = &runner;

        thread::scope(|scope| {
            let (done_tx, done_rx) = unbounded::<(PathBuf, bool)>();
            let mut in_flight = 0usize;

            let mut record = |(target, ok): (PathBuf, bool)| {
                if ok {
                    summary.succeeded += 1;
                } else {
                    summary.failed.push(target);
                }
            };

            for job in jobs {
                if in_flight >= self.max_parallel {
                    match done_rx.recv() {
                        Ok(done) => record(done),
                        Err(_) => break,
                    }
                    in_flight -= 1;
                }

                debug!(
                    "Starting job for {} ({} in flight)",
                    job.target_file.display(),
                    in_flight
                );
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    let ok = panic::catch_unwind(AssertUnwindSafe(|| runner(job)))
                        .unwrap_or_else(|_| {
                            error!("Job for {} panicked", job.target_file.display());
                            false
                        });
                    let _ = done_tx.send((job.target_file.clone(), ok));
                });
                in_flight += 1;
            }
            drop(done_tx);

            while in_flight > 0 {
                match done_rx.recv() {
                    Ok(done) => record(done),
                    Err(_) => break,
                }
                in_flight -= 1;
            }
        });

        summary.failed.sort();
        info!(
            "Finished {} jobs: {} succeeded, {} failed",
            summary.total,
            summary.succeeded,
            summary.failed.len()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(target: &str) -> ConversionJob {
        ConversionJob::new(vec![], target)
    }

    #[test]
    fn test_zero_cap_is_raised() {
        assert_eq!(Scheduler::new(0).max_parallel(), 1);
    }

    #[test]
    fn test_failures_are_collected() {
        let jobs = vec![job("b"), job("a"), job("c")];
        let summary = Scheduler::new(2).run(&jobs, |job| job.target_file != PathBuf::from("a"));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, vec![PathBuf::from("a")]);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_panicking_runner_counts_as_failure() {
        let jobs = vec![job("ok"), job("boom")];
        let summary = Scheduler::new(1).run(&jobs, |job| {
            if job.target_file == PathBuf::from("boom") {
                panic!("runner exploded");
            }
            true
        });
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, vec![PathBuf::from("boom")]);
    }

    #[test]
    fn test_empty_job_list() {
        let summary = Scheduler::new(4).run(&[], |_| true);
        assert_eq!(summary, ScheduleSummary::default());
    }
}
