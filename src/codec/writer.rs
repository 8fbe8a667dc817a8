//! Buffered writer for canonical record streams.
//!
//! Every target file is written exclusively through a [`RecordWriter`].

use super::varint::write_varint;
use crate::record::Record;
use crate::utils::config::WRITER_BUFFER_SIZE;
use crate::utils::error::CodecError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Length-prefixing record writer
pub struct RecordWriter<W: Write> {
    inner: BufWriter<W>,
    records: u64,
    bytes: u64,
}

impl RecordWriter<File> {
    /// Create (or truncate) `path` and write records into it
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(WRITER_BUFFER_SIZE, sink),
            records: 0,
            bytes: 0,
        }
    }

    /// Append one record as `varint(len(payload)) payload`
    ///
    /// **Public** - the single write path for target files
    ///
    /// `write_all` keeps retrying short writes until the full byte string is
    /// accepted, so on `Ok` the whole record is buffered; on `Err` the sink
    /// reported a failure and the stream must be considered broken.
    pub fn write_record(&mut self, record: &Record) -> Result<(), CodecError> {
        let payload = record.encode();
        let prefix_len = write_varint(&mut self.inner, payload.len() as u64)?;
        self.inner.write_all(&payload)?;

        self.records += 1;
        self.bytes += (prefix_len + payload.len()) as u64;
        Ok(())
    }

    /// Push buffered bytes to the sink
    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink
    pub fn finish(self) -> Result<W, CodecError> {
        self.inner
            .into_inner()
            .map_err(|e| CodecError::Io(e.into_error()))
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Bytes written so far, prefixes included
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChunkRecord, FileRecord};

    #[test]
    fn test_write_prefixes_length() {
        let mut writer = RecordWriter::new(Vec::new());
        let chunk = ChunkRecord::new(vec![0xab; 10], 204);
        writer.write_record(&Record::Chunk(chunk.clone())).unwrap();
        let out = writer.finish().unwrap();

        let payload = chunk.encode();
        assert_eq!(out[0] as usize, payload.len());
        assert_eq!(&out[1..], payload.as_slice());
    }

    #[test]
    fn test_counters() {
        let mut writer = RecordWriter::new(Vec::new());
        writer
            .write_record(&Record::File(FileRecord::new("x", 1, 0)))
            .unwrap();
        writer
            .write_record(&Record::File(FileRecord::new("y", 2, 0)))
            .unwrap();
        assert_eq!(writer.records_written(), 2);
        let bytes = writer.bytes_written();
        assert_eq!(writer.finish().unwrap().len() as u64, bytes);
    }
}
