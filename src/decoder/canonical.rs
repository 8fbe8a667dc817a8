//! Decoder over already-canonical traces.
//!
//! Lets canonical files be merged or re-written by the same conversion jobs
//! that handle the legacy encodings.

use super::Decoder;
use crate::codec::CanonicalReader;
use crate::record::FileEntry;
use crate::utils::error::DecodeError;
use std::io::Read;

pub struct CanonicalDecoder<R: Read> {
    reader: CanonicalReader<R>,
}

impl<R: Read> CanonicalDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: CanonicalReader::new(reader),
        }
    }
}

impl<R: Read> Decoder for CanonicalDecoder<R> {
    fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError> {
        Ok(self.reader.next_entry()?)
    }
}
