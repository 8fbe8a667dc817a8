//! Output writers for run summaries and statistics.
//!
//! This module handles writing data to disk in various formats:
//! - JSON summaries (build runs, refcount statistics)
//! - CSV histograms

pub mod csv;
pub mod json;
pub mod summary;

// Re-export main functions
pub use csv::write_csv_lines;
pub use json::{to_json_string, write_json};
pub use summary::BuildSummary;
