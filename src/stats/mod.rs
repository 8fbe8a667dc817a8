//! Chunk statistics over canonical traces.
//!
//! This module handles:
//! - Refcount skewness: how many distinct chunks occur exactly N times
//! - Stream skewness: how many distinct chunks occur in exactly N streams
//!
//! Chunks are identified by a fixed-width key cut from their fingerprint.

pub mod refcount;
pub mod streams;

// Re-export main types
pub use refcount::{compute_refcounts, MostUsedChunk, RefcountReport, RefcountSummary, SpecialChunks};
pub use streams::{compute_stream_skewness, StreamBucket, StreamReport};

use crate::codec::CanonicalReader;
use crate::record::FileEntry;
use crate::utils::config::DEFAULT_STATS_KEY_WIDTH;
use crate::utils::error::StatsError;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Settings shared by the statistics reducers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsOptions {
    /// Bytes of fingerprint used as chunk key
    pub key_width: usize,

    /// Only consider traced files whose name ends with this suffix
    pub filename_suffix: Option<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            key_width: DEFAULT_STATS_KEY_WIDTH,
            filename_suffix: None,
        }
    }
}

impl StatsOptions {
    /// # Errors
    /// * `StatsError::InvalidKeyWidth` - width is zero
    pub fn new(key_width: usize, filename_suffix: Option<String>) -> Result<Self, StatsError> {
        if key_width == 0 {
            return Err(StatsError::InvalidKeyWidth(key_width));
        }
        Ok(Self {
            key_width,
            filename_suffix,
        })
    }

    fn accepts(&self, filename: &[u8]) -> bool {
        match &self.filename_suffix {
            Some(suffix) => filename.ends_with(suffix.as_bytes()),
            None => true,
        }
    }
}

/// Cut or zero-pad a fingerprint to `width` bytes
pub fn chunk_key(fingerprint: &[u8], width: usize) -> Vec<u8> {
    let mut key = vec![0u8; width];
    let n = fingerprint.len().min(width);
    key[..n].copy_from_slice(&fingerprint[..n]);
    key
}

/// Feed every accepted file entry of every trace to `visit`, together with
/// the trace it came from
///
/// **Private** - shared driver of both reducers
fn for_each_entry<F>(traces: &[PathBuf], options: &StatsOptions, mut visit: F) -> Result<(), StatsError>
where
    F: FnMut(&Path, &FileEntry),
{
    for trace in traces {
        info!("Processing {}", trace.display());
        let mut reader = CanonicalReader::open(trace).map_err(|e| trace_error(trace, e))?;

        while let Some(entry) = reader.next_entry().map_err(|e| trace_error(trace, e))? {
            if !options.accepts(&entry.file.filename) {
                debug!("Skipping traced file {}", entry.file.display_name());
                continue;
            }
            visit(trace, &entry);
        }
    }
    Ok(())
}

fn trace_error(path: &Path, source: crate::utils::error::CodecError) -> StatsError {
    StatsError::Trace {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::RecordWriter;
    use crate::record::{ChunkRecord, FileRecord};

    /// Write `(filename, [(fingerprint, size)])` entries as a canonical trace
    pub(crate) fn write_trace(path: &Path, entries: &[(&str, Vec<(Vec<u8>, u32)>)]) {
        let mut writer = RecordWriter::create(path).unwrap();
        for (name, chunks) in entries {
            let chunks = chunks
                .iter()
                .map(|(fp, size)| ChunkRecord::new(fp.clone(), *size))
                .collect();
            for record in FileEntry::new(FileRecord::new(*name, 0, 0), chunks).into_records() {
                writer.write_record(&record).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_chunk_key_truncates_and_pads() {
        assert_eq!(chunk_key(&[1, 2, 3, 4], 2), vec![1, 2]);
        assert_eq!(chunk_key(&[1, 2], 4), vec![1, 2, 0, 0]);
        assert_eq!(chunk_key(&[], 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_zero_key_width_rejected() {
        assert!(matches!(
            StatsOptions::new(0, None),
            Err(StatsError::InvalidKeyWidth(0))
        ));
    }

    #[test]
    fn test_suffix_filter() {
        let options = StatsOptions::new(12, Some("dmtcp".into())).unwrap();
        assert!(options.accepts(b"/ckpt/1234.dmtcp"));
        assert!(!options.accepts(b"/ckpt/1234.log"));
        assert!(StatsOptions::default().accepts(b"anything"));
    }
}
