//! Build plan loading.
//!
//! A build plan maps each simulated day to the target files that must be
//! generated for it and the source traces merged into each target. Plans are
//! produced by the generator; this module only reads them.

use crate::job::ConversionJob;
use crate::utils::error::PlanError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parameters the generator used to assemble the plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GeneratorConfig {
    pub seed: i64,
    pub num_nodes: u32,
    pub num_streams: u32,
    pub trace_run: String,
    pub meta_info_hash: String,
}

/// Build instruction for one stream on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanForDay {
    pub target_file: PathBuf,
    #[serde(default)]
    pub source_files: Vec<PathBuf>,
}

/// Complete build plan as written by the generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GeneratorConfig>,

    #[serde(default)]
    pub plan: BTreeMap<String, Vec<PlanForDay>>,
}

impl BuildPlan {
    /// Parse a plan from its JSON text
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Day keys in build order
    ///
    /// Numeric keys come first in numeric order; any other keys follow in
    /// lexicographic order.
    pub fn days(&self) -> Vec<&str> {
        let mut days: Vec<&str> = self.plan.keys().map(String::as_str).collect();
        days.sort_by(|a, b| compare_days(a, b));
        days
    }

    /// Flatten the plan into conversion jobs, day by day
    ///
    /// **Public** - feeds the scheduler
    pub fn jobs(&self) -> Vec<ConversionJob> {
        let mut jobs = Vec::new();
        for day in self.days() {
            for entry in &self.plan[day] {
                jobs.push(ConversionJob::new(
                    entry.source_files.clone(),
                    entry.target_file.clone(),
                ));
            }
        }
        jobs
    }

    pub fn job_count(&self) -> usize {
        self.plan.values().map(Vec::len).sum()
    }
}

fn compare_days(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Load a build plan from disk
///
/// **Public** - used by the `build` command
///
/// # Errors
/// * `PlanError::ReadFailed` - file cannot be read
/// * `PlanError::InvalidJson` - file is not a plan
/// * `PlanError::Empty` - plan contains no jobs
pub fn load_plan(path: impl AsRef<Path>) -> Result<BuildPlan, PlanError> {
    let path = path.as_ref();
    debug!("Loading build plan from {}", path.display());

    let json = std::fs::read_to_string(path)?;
    let plan = BuildPlan::from_json(&json)?;

    if plan.job_count() == 0 {
        return Err(PlanError::Empty);
    }

    info!(
        "Loaded plan with {} days and {} jobs",
        plan.plan.len(),
        plan.job_count()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "Config": { "Seed": 1, "NumNodes": 2, "NumStreams": 1,
                    "TraceRun": "8rb", "MetaInfoHash": "abc" },
        "Plan": {
            "10": [ { "TargetFile": "/out/gen_10_stream0", "SourceFiles": ["/data/b.gz", "/data/a.gz"] } ],
            "2":  [ { "TargetFile": "/out/gen_2_stream0", "SourceFiles": ["/data/c.gz"] } ]
        }
    }"#;

    #[test]
    fn test_parse_sample_plan() {
        let plan = BuildPlan::from_json(SAMPLE).unwrap();
        let config = plan.config.clone().unwrap();
        assert_eq!(config.seed, 1);
        assert_eq!(config.trace_run, "8rb");
        assert_eq!(plan.job_count(), 2);
    }

    #[test]
    fn test_days_are_numeric_order() {
        let plan = BuildPlan::from_json(SAMPLE).unwrap();
        assert_eq!(plan.days(), vec!["2", "10"]);

        let jobs = plan.jobs();
        assert_eq!(jobs[0].target_file, PathBuf::from("/out/gen_2_stream0"));
        assert_eq!(
            jobs[1].source_files,
            vec![PathBuf::from("/data/a.gz"), PathBuf::from("/data/b.gz")]
        );
    }

    #[test]
    fn test_mixed_day_keys() {
        let mut days = vec!["b", "3", "a", "01", "1"];
        days.sort_by(|a, b| compare_days(a, b));
        assert_eq!(days, vec!["01", "1", "3", "a", "b"]);
    }

    #[test]
    fn test_config_is_optional() {
        let plan = BuildPlan::from_json(r#"{ "Plan": { "0": [] } }"#).unwrap();
        assert!(plan.config.is_none());
        assert_eq!(plan.job_count(), 0);
    }
}
