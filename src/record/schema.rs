//! Protobuf wire messages behind the canonical record payloads.
//!
//! The messages mirror the proto2 definitions the downstream analysis tools
//! were built against, so every field is optional on the wire and presence of
//! the required ones is checked when converting into the domain records.
//! Filename and type are declared `string` there but carried as `bytes` here;
//! the wire encoding is identical and traced names need not be UTF-8.

use super::{ChunkRecord, FileRecord};
use crate::utils::error::CodecError;
use prost::Message;

/// Wire form of a traced file
#[derive(Clone, PartialEq, Message)]
pub struct FileMessage {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub filename: Option<Vec<u8>>,

    #[prost(uint64, optional, tag = "2")]
    pub fsize: Option<u64>,

    #[prost(string, optional, tag = "3")]
    pub label: Option<String>,

    #[prost(bytes = "vec", optional, tag = "4")]
    pub r#type: Option<Vec<u8>>,

    #[prost(uint32, optional, tag = "5")]
    pub chunk_count: Option<u32>,
}

/// Wire form of a chunk
#[derive(Clone, PartialEq, Message)]
pub struct ChunkMessage {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub fp: Option<Vec<u8>>,

    #[prost(uint32, optional, tag = "2")]
    pub csize: Option<u32>,
}

impl From<&FileRecord> for FileMessage {
    fn from(file: &FileRecord) -> Self {
        Self {
            filename: Some(file.filename.clone()),
            fsize: Some(file.size),
            label: (!file.label.is_empty()).then(|| file.label.clone()),
            r#type: (!file.file_type.is_empty()).then(|| file.file_type.clone()),
            chunk_count: Some(file.chunk_count),
        }
    }
}

impl TryFrom<FileMessage> for FileRecord {
    type Error = CodecError;

    fn try_from(msg: FileMessage) -> Result<Self, Self::Error> {
        Ok(FileRecord {
            filename: msg.filename.ok_or_else(|| missing("File.filename"))?,
            size: msg.fsize.ok_or_else(|| missing("File.fsize"))?,
            label: msg.label.unwrap_or_default(),
            file_type: msg.r#type.unwrap_or_default(),
            chunk_count: msg.chunk_count.ok_or_else(|| missing("File.chunkCount"))?,
        })
    }
}

impl From<&ChunkRecord> for ChunkMessage {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            fp: Some(chunk.fingerprint.clone()),
            csize: Some(chunk.size),
        }
    }
}

impl TryFrom<ChunkMessage> for ChunkRecord {
    type Error = CodecError;

    fn try_from(msg: ChunkMessage) -> Result<Self, Self::Error> {
        Ok(ChunkRecord {
            fingerprint: msg.fp.ok_or_else(|| missing("Chunk.fp"))?,
            size: msg.csize.ok_or_else(|| missing("Chunk.csize"))?,
        })
    }
}

/// Decode a FileRecord payload
pub fn decode_file(payload: &[u8]) -> Result<FileRecord, CodecError> {
    FileMessage::decode(payload)?.try_into()
}

/// Decode a ChunkRecord payload
pub fn decode_chunk(payload: &[u8]) -> Result<ChunkRecord, CodecError> {
    ChunkMessage::decode(payload)?.try_into()
}

fn missing(field: &str) -> CodecError {
    CodecError::FieldDecodeError(format!("missing required field {}", field))
}
