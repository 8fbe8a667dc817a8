//! Strict reader for canonical record streams.
//!
//! Used both by consumers of converted traces and to re-walk a freshly
//! written target as an independent check of the conversion.

use super::varint::read_varint;
use crate::record::{ChunkRecord, FileEntry, FileRecord};
use crate::utils::config::READER_BUFFER_SIZE;
use crate::utils::error::CodecError;
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read one length-prefixed payload
///
/// **Public** - framing half of the codec
///
/// # Returns
/// `Ok(None)` when the input ends cleanly before the length prefix
///
/// # Errors
/// * `CodecError::TruncatedVarint` - input ended inside the prefix
/// * `CodecError::TruncatedRecord` - fewer payload bytes than announced
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, CodecError> {
    let Some(len) = read_varint(reader)? else {
        return Ok(None);
    };

    let mut payload = Vec::new();
    let available = reader.by_ref().take(len).read_to_end(&mut payload)? as u64;
    if available < len {
        return Err(CodecError::TruncatedRecord {
            expected: len,
            available,
        });
    }

    Ok(Some(payload))
}

/// Sequential reader yielding one file entry at a time
pub struct CanonicalReader<R: Read> {
    reader: R,
    records: u64,
}

impl CanonicalReader<BufReader<File>> {
    /// Open a canonical trace file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(READER_BUFFER_SIZE, file)))
    }
}

impl<R: Read> CanonicalReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, records: 0 }
    }

    /// Read the next FileRecord and exactly `chunk_count` ChunkRecords
    ///
    /// # Returns
    /// `Ok(None)` at a clean end of stream (on a FileRecord boundary)
    ///
    /// # Errors
    /// * framing errors from [`read_record`]
    /// * `CodecError::FieldDecodeError` - payload is not the expected record
    /// * `CodecError::MissingChunks` - stream ended while chunks were owed
    pub fn next_entry(&mut self) -> Result<Option<FileEntry>, CodecError> {
        let Some(payload) = read_record(&mut self.reader)? else {
            return Ok(None);
        };
        let file = FileRecord::decode(&payload)?;
        self.records += 1;

        let mut chunks = Vec::with_capacity(file.chunk_count.min(4096) as usize);
        for found in 0..file.chunk_count {
            let Some(payload) = read_record(&mut self.reader)? else {
                return Err(CodecError::MissingChunks {
                    filename: file.display_name().into_owned(),
                    expected: file.chunk_count,
                    found,
                });
            };
            chunks.push(ChunkRecord::decode(&payload)?);
            self.records += 1;
        }

        Ok(Some(FileEntry { file, chunks }))
    }

    /// Records consumed so far
    pub fn records_read(&self) -> u64 {
        self.records
    }
}

impl<R: Read> Iterator for CanonicalReader<R> {
    type Item = Result<FileEntry, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Totals of a fully walked canonical stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub files: u64,
    pub chunks: u64,
    pub records: u64,
    pub bytes: u64,
}

/// Walk a whole canonical file, checking every record
///
/// **Public** - used by the `validate` command and job verification
pub fn validate_stream(path: impl AsRef<Path>) -> Result<StreamSummary, CodecError> {
    let path = path.as_ref();
    debug!("Validating canonical stream: {}", path.display());

    let bytes = std::fs::metadata(path)?.len();
    let mut reader = CanonicalReader::open(path)?;
    let mut summary = StreamSummary {
        bytes,
        ..Default::default()
    };

    while let Some(entry) = reader.next_entry()? {
        summary.files += 1;
        summary.chunks += entry.chunks.len() as u64;
    }
    summary.records = reader.records_read();

    debug!(
        "Stream {} holds {} files and {} chunks",
        path.display(),
        summary.files,
        summary.chunks
    );
    Ok(summary)
}
