//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod build;
pub mod convert;
pub mod stats;
pub mod utils;
pub mod validate;

// Re-export main command functions
pub use build::{execute_build, validate_build_args, BuildArgs};
pub use convert::{execute_convert, ConvertArgs};
pub use stats::{execute_refcount, execute_streams, validate_stats_args, StatsArgs};
pub use utils::display_version;
pub use validate::execute_validate;
