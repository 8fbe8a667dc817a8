//! Configuration and constants for the converters and the CLI.

/// Current schema version of the JSON summaries we write
pub const SCHEMA_VERSION: &str = "1.0.0";

// I/O buffering: 4 MiB on both the reading and the writing side
pub const WRITER_BUFFER_SIZE: usize = 4 * 1024 * 1024;
pub const READER_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Records in flight between a decoder thread and the writer
pub const RECORD_QUEUE_CAPACITY: usize = 10_000;

/// A u64 never needs more than 10 varint bytes
pub const MAX_VARINT_LEN: usize = 10;

// Legacy binary chunk records: one length byte, then 4 bytes size + 20 bytes fingerprint
pub const LEGACY_RECORD_LEN: u8 = 24;
pub const LEGACY_FINGERPRINT_LEN: usize = 20;
pub const LEGACY_MAX_CHUNK_SIZE: u32 = 64 * 1024;

// UBC text dumps
pub const UBC_ENTRY_PATTERN: &str = "([0-9a-fz]+):([0-9]+)";
pub const UBC_LOG_COMPLETE: &str = "LOGCOMPLETE";
pub const UBC_ZERO_CHUNK_TOKEN: &str = "zzzzzzzzzzzz";
pub const UBC_ZERO_FINGERPRINT_LEN: usize = UBC_ZERO_CHUNK_TOKEN.len() / 2;
pub const UBC_SKIPPED_META_LINES: usize = 7;
pub const UBC_FRAGMENT_PREFIXES: &[&str] = &["SV:", "V:", "A:"];

/// Prefix for job-private temporary directories
pub const WORKSPACE_PREFIX: &str = "multiTraceGeneration";

/// Default number of concurrently running conversion jobs
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Default fingerprint prefix width used as a chunk key by the statistics
pub const DEFAULT_STATS_KEY_WIDTH: usize = 12;

/// Well-known 12-byte keys of the all-zero and all-one chunk, per chunking
/// method: `(method, zero, one)`. A trace uses the first method whose name
/// occurs in its path.
pub const SPECIAL_CHUNKS: &[(&str, &str, &str)] = &[
    ("cdc4", "897256b6709e1a4da9daba92", "95e00e7bbef9a74788304629"),
    ("cdc8", "5188431849b4613152fd7bdb", "04f90e279f910e4823b29054"),
    ("cdc16", "1adc95bebe9eea8c112d40cd", "174d9c9e92d4e03045df6bad"),
    ("fixed2", "605db3fdbaff4ba13729371a", "e6333e53570fb05a841a7f14"),
    ("fixed4", "1ceaf73df40e531df3bfb26b", "e0c66649d1434eca3435033a"),
    ("fixed8", "0631457264ff7f8d5fb1edc2", "5e2b96c19c4f5c63a5afa2de"),
    ("fixed16", "897256b6709e1a4da9daba92", "547372f1044a3442aa52fcd2"),
    ("fixed32", "5188431849b4613152fd7bdb", "ca711c69165e1fa5be72993b"),
];
pub const DEFAULT_CHUNKING_METHOD: &str = "cdc8";
pub const SPECIAL_CHUNK_KEY_LEN: usize = 12;
