//! Decoder for the legacy fixed-binary trace encoding.
//!
//! Layout of one file entry:
//!
//! ```text
//! filename \t size [\t type] \n
//! ( 0x18 | size: u32 LE | fingerprint: [u8; 20] )*
//! [ 0x00 ... \n ]
//! ```
//!
//! The chunk list ends at end of input, at a zero length byte (the rest of
//! that line is discarded), at a length byte other than 24 (malformed) or at
//! an implausible chunk size.

use super::Decoder;
use crate::record::{ChunkRecord, FileEntry, FileRecord};
use crate::utils::config::{LEGACY_FINGERPRINT_LEN, LEGACY_MAX_CHUNK_SIZE, LEGACY_RECORD_LEN};
use crate::utils::error::DecodeError;
use log::{debug, error, warn};
use std::io::{BufRead, ErrorKind};

/// Outcome of one step of the chunk loop
#[derive(Debug)]
enum ChunkStep {
    Chunk(ChunkRecord),
    /// End of input or the zero sentinel
    End,
    /// Length byte other than 24
    Malformed(u8),
    /// Chunk size at or above 64 KiB
    Implausible(u32),
}

/// Streaming decoder over a legacy trace
pub struct LegacyDecoder<R: BufRead> {
    reader: R,
    finished: bool,
    entries: u64,
}

impl<R: BufRead> LegacyDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
            entries: 0,
        }
    }

    /// Parse one `filename<TAB>size[<TAB>type]` header line
    ///
    /// **Private** - returns `None` at end of input or on a header that
    /// cannot be split into two or three fields
    fn read_header(&mut self) -> Result<Option<FileRecord>, DecodeError> {
        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }

        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        let fields: Vec<&[u8]> = raw.split(|b| *b == b'\t').collect();

        if fields.len() != 2 && fields.len() != 3 {
            error!(
                "Legacy header has {} fields, expected 2 or 3: {:?}",
                fields.len(),
                String::from_utf8_lossy(&raw)
            );
            return Ok(None);
        }

        let size = std::str::from_utf8(fields[1])
            .ok()
            .and_then(|text| text.parse::<u64>().ok())
            .unwrap_or_else(|| {
                warn!(
                    "Unparsable size {:?} for {}",
                    String::from_utf8_lossy(fields[1]),
                    String::from_utf8_lossy(fields[0])
                );
                0
            });

        Ok(Some(FileRecord {
            filename: fields[0].to_vec(),
            size,
            file_type: fields.get(2).map(|t| t.to_vec()).unwrap_or_default(),
            ..Default::default()
        }))
    }

    /// Parse the next chunk record or detect the end of the chunk list
    ///
    /// **Private** - applies the termination rules in order
    fn next_chunk(&mut self) -> Result<ChunkStep, DecodeError> {
        let mut record_len = [0u8; 1];
        match self.reader.read_exact(&mut record_len) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(ChunkStep::End),
            Err(e) => return Err(e.into()),
        }

        match record_len[0] {
            0 => {
                let mut rest = Vec::new();
                self.reader.read_until(b'\n', &mut rest)?;
                return Ok(ChunkStep::End);
            }
            LEGACY_RECORD_LEN => {}
            other => return Ok(ChunkStep::Malformed(other)),
        }

        let mut size = [0u8; 4];
        self.read_body(&mut size)?;
        let size = u32::from_le_bytes(size);
        if size >= LEGACY_MAX_CHUNK_SIZE {
            return Ok(ChunkStep::Implausible(size));
        }

        let mut fingerprint = vec![0u8; LEGACY_FINGERPRINT_LEN];
        self.read_body(&mut fingerprint)?;

        Ok(ChunkStep::Chunk(ChunkRecord::new(fingerprint, size)))
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                DecodeError::UnexpectedEof("legacy chunk record")
            } else {
                DecodeError::Io(e)
            }
        })
    }
}

impl<R: BufRead> Decoder for LegacyDecoder<R> {
    fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError> {
        if self.finished {
            return Ok(None);
        }

        let Some(file) = self.read_header()? else {
            debug!("Legacy trace finished after {} entries", self.entries);
            self.finished = true;
            return Ok(None);
        };

        let mut chunks = Vec::new();
        loop {
            match self.next_chunk()? {
                ChunkStep::Chunk(chunk) => chunks.push(chunk),
                ChunkStep::End => break,
                ChunkStep::Malformed(len) => {
                    error!(
                        "Record length {} != {} in chunks of {}, keeping {} chunks",
                        len,
                        LEGACY_RECORD_LEN,
                        file.display_name(),
                        chunks.len()
                    );
                    break;
                }
                ChunkStep::Implausible(size) => {
                    error!("Illegal chunk size {} in {}", size, file.display_name());
                    break;
                }
            }
        }

        self.entries += 1;
        Ok(Some(FileEntry::new(file, chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk_bytes(size: u32, fp_byte: u8) -> Vec<u8> {
        let mut out = vec![LEGACY_RECORD_LEN];
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&[fp_byte; LEGACY_FINGERPRINT_LEN]);
        out
    }

    #[test]
    fn test_header_with_type() {
        let mut decoder = LegacyDecoder::new(Cursor::new(b"a.txt\t7\ttext\n\0\n".to_vec()));
        let entry = decoder.next_entry().unwrap().unwrap();
        assert_eq!(entry.file.filename, b"a.txt");
        assert_eq!(entry.file.size, 7);
        assert_eq!(entry.file.file_type, b"text");
        assert!(decoder.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_header_bytes_are_kept_verbatim() {
        let mut decoder = LegacyDecoder::new(Cursor::new(b"caf\xe9.txt\t42\n\0\n".to_vec()));
        let entry = decoder.next_entry().unwrap().unwrap();
        assert_eq!(entry.file.filename, b"caf\xe9.txt");
        assert_eq!(entry.file.size, 42);
    }

    #[test]
    fn test_bad_header_ends_decoding() {
        let mut decoder = LegacyDecoder::new(Cursor::new(b"only-one-field\n".to_vec()));
        assert!(decoder.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_implausible_size_stops_chunks() {
        let mut data = b"big\t1\n".to_vec();
        data.extend(chunk_bytes(100, 1));
        data.extend(chunk_bytes(LEGACY_MAX_CHUNK_SIZE, 2));
        let mut decoder = LegacyDecoder::new(Cursor::new(data));
        let entry = decoder.next_entry().unwrap().unwrap();
        assert_eq!(entry.file.chunk_count, 1);
        assert_eq!(entry.chunks[0].size, 100);
    }

    #[test]
    fn test_truncated_body_is_fatal() {
        let mut data = b"cut\t1\n".to_vec();
        data.extend(&chunk_bytes(100, 1)[..10]);
        let mut decoder = LegacyDecoder::new(Cursor::new(data));
        assert!(matches!(
            decoder.next_entry(),
            Err(DecodeError::UnexpectedEof(_))
        ));
    }
}
