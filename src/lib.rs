//! Dedup Trace Tools
//!
//! Conversion of file-system chunking traces into a canonical
//! length-prefixed record stream, plus chunk statistics over the result.
//!
//! This crate provides the core implementation for the
//! `dedup-trace` CLI tool:
//!
//! - [`decoder`] reads legacy binary, UBC text and canonical traces
//! - [`codec`] writes and validates canonical streams
//! - [`job`] merges many sources into one target and schedules jobs
//! - [`plan`] loads build plans
//! - [`stats`] computes refcount and stream skewness
//!
//! ## Getting Started
//!
//! ```bash
//! dedup-trace build --plan plan.json --max-parallel 8 --summary run.json
//! dedup-trace refcount --traces day1,day2 --out refs.csv
//! ```

pub mod codec;
pub mod commands;
pub mod decoder;
pub mod job;
pub mod output;
pub mod plan;
pub mod record;
pub mod stats;
pub mod utils;
