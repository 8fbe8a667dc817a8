//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the canonical record codec (varint framing and payloads)
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("stream ended in the middle of a varint length prefix")]
    TruncatedVarint,

    #[error("varint length prefix exceeds 64 bits")]
    VarintOverflow,

    #[error("record truncated: expected {expected} bytes, only {available} available")]
    TruncatedRecord { expected: u64, available: u64 },

    #[error("record payload could not be decoded: {0}")]
    FieldDecodeError(String),

    #[error("file '{filename}' announced {expected} chunks but the stream ended after {found}")]
    MissingChunks {
        filename: String,
        expected: u32,
        found: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<prost::DecodeError> for CodecError {
    fn from(err: prost::DecodeError) -> Self {
        CodecError::FieldDecodeError(err.to_string())
    }
}

/// Fatal errors while decoding a source trace
///
/// Malformed records are recovered inside the decoders and never surface here.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input ended unexpectedly while reading {0}")]
    UnexpectedEof(&'static str),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors that abort a single conversion job
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Cannot create workspace under {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot copy {from} into the workspace: {source}")]
    Copy {
        from: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot decompress {path}: {reason}")]
    Decompress { path: PathBuf, reason: String },

    #[error("Cannot open target {path}: {source}")]
    Target {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Decoding {path} failed: {source}")]
    Decode { path: PathBuf, source: DecodeError },

    #[error("Writing {path} failed: {source}")]
    Write { path: PathBuf, source: CodecError },

    #[error("Decoder thread for {0} panicked")]
    DecoderPanicked(PathBuf),

    #[error("Verification of {path} failed: {reason}")]
    Verify { path: PathBuf, reason: String },
}

/// Errors that can occur while loading a build plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read plan: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Invalid plan JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Plan contains no jobs")]
    Empty,
}

/// Errors that can occur while computing chunk statistics
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Cannot read trace {path}: {source}")]
    Trace { path: PathBuf, source: CodecError },

    #[error("Invalid key width: {0}")]
    InvalidKeyWidth(usize),

    #[error("Invalid special chunk key for {method}: {source}")]
    InvalidSpecialChunk {
        method: &'static str,
        source: hex::FromHexError,
    },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
