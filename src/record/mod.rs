//! Canonical trace records.
//!
//! A canonical stream alternates one [`FileRecord`] with exactly
//! `chunk_count` [`ChunkRecord`]s. Decoders yield whole [`FileEntry`] values
//! so the count can never drift from the chunk list it describes.

pub mod schema;

use crate::utils::error::CodecError;
use prost::Message;
use std::borrow::Cow;

/// One traced file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileRecord {
    /// Raw name bytes as traced; not necessarily UTF-8
    pub filename: Vec<u8>,

    /// File size in bytes
    pub size: u64,

    /// May be empty
    pub label: String,

    /// May be empty; raw bytes like the filename
    pub file_type: Vec<u8>,

    /// Number of ChunkRecords that follow this record
    pub chunk_count: u32,
}

impl FileRecord {
    /// Create a record with empty label and type
    pub fn new(filename: impl Into<Vec<u8>>, size: u64, chunk_count: u32) -> Self {
        Self {
            filename: filename.into(),
            size,
            chunk_count,
            ..Default::default()
        }
    }

    /// Filename for display, with invalid UTF-8 replaced
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.filename)
    }

    /// Serialize to the canonical payload (without length prefix)
    pub fn encode(&self) -> Vec<u8> {
        schema::FileMessage::from(self).encode_to_vec()
    }

    /// Parse a canonical payload
    ///
    /// # Errors
    /// * `CodecError::FieldDecodeError` - malformed payload or a missing
    ///   filename, size or chunk count
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        schema::decode_file(payload)
    }
}

/// One chunk of the preceding file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkRecord {
    /// Raw fingerprint; width depends on the source encoding
    pub fingerprint: Vec<u8>,

    /// Chunk size in bytes
    pub size: u32,
}

impl ChunkRecord {
    pub fn new(fingerprint: impl Into<Vec<u8>>, size: u32) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            size,
        }
    }

    /// Serialize to the canonical payload (without length prefix)
    pub fn encode(&self) -> Vec<u8> {
        schema::ChunkMessage::from(self).encode_to_vec()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        schema::decode_chunk(payload)
    }
}

/// Message passed from a decoder to the record writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    File(FileRecord),
    Chunk(ChunkRecord),
}

impl Record {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::File(file) => file.encode(),
            Record::Chunk(chunk) => chunk.encode(),
        }
    }
}

/// A file together with its chunks, the unit every decoder produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file: FileRecord,
    pub chunks: Vec<ChunkRecord>,
}

impl FileEntry {
    /// Build an entry, fixing `chunk_count` to the number of chunks given
    pub fn new(mut file: FileRecord, chunks: Vec<ChunkRecord>) -> Self {
        file.chunk_count = chunks.len() as u32;
        Self { file, chunks }
    }

    /// Expand into the FileRecord followed by its ChunkRecords
    pub fn into_records(self) -> impl Iterator<Item = Record> {
        std::iter::once(Record::File(self.file)).chain(self.chunks.into_iter().map(Record::Chunk))
    }

    /// Total number of records this entry occupies in a stream
    pub fn record_count(&self) -> u64 {
        1 + self.chunks.len() as u64
    }
}
