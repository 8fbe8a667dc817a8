//! Canonical record codec.
//!
//! This module handles:
//! - Varint length prefixes
//! - Buffered, all-or-error record writing
//! - Strict sequential reading and validation of canonical streams

pub mod reader;
pub mod varint;
pub mod writer;

// Re-export main types
pub use reader::{read_record, validate_stream, CanonicalReader, StreamSummary};
pub use varint::{encode_varint, read_varint, write_varint};
pub use writer::RecordWriter;
