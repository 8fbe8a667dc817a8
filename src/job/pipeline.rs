//! Decoder-to-writer pipeline for a single source file.
//!
//! The decoder runs on its own thread and pushes records through a bounded
//! channel; the calling thread owns the [`RecordWriter`] and drains the
//! channel. A full channel blocks the decoder, which bounds memory for files
//! with huge chunk lists.

use crate::codec::RecordWriter;
use crate::decoder::Decoder;
use crate::record::Record;
use crate::utils::config::RECORD_QUEUE_CAPACITY;
use crate::utils::error::{CodecError, DecodeError};
use crossbeam::channel::{bounded, Sender};
use log::debug;
use std::io::Write;
use std::thread;

/// Counters for one decoded source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub files: u64,
    pub chunks: u64,
}

/// Failure of either side of the pipeline
#[derive(Debug)]
pub enum PipelineError {
    Decode(DecodeError),
    Write(CodecError),
    DecoderPanicked,
}

/// Decode everything `decoder` yields into `writer`
///
/// **Public** - used by conversion jobs once per source file
///
/// Records reach the writer in decoding order. A write failure stops the
/// decoder at its next send; a decode failure stops the pipeline after the
/// records already produced have been written.
pub fn decode_into<D, W>(decoder: D, writer: &mut RecordWriter<W>) -> Result<SourceStats, PipelineError>
where
    D: Decoder + Send,
    W: Write,
{
    let (tx, rx) = bounded::<Record>(RECORD_QUEUE_CAPACITY);

    thread::scope(|scope| {
        let producer = scope.spawn(move || produce(decoder, tx));

        let mut write_result = Ok(());
        for record in rx.iter() {
            if let Err(e) = writer.write_record(&record) {
                write_result = Err(e);
                break;
            }
        }
        // Unblocks a producer waiting on a full channel after a write failure
        drop(rx);

        let produced = producer.join().map_err(|_| PipelineError::DecoderPanicked)?;
        write_result.map_err(PipelineError::Write)?;
        produced.map_err(PipelineError::Decode)
    })
}

/// Producer side: expand entries into records and send them
fn produce<D: Decoder>(mut decoder: D, tx: Sender<Record>) -> Result<SourceStats, DecodeError> {
    let mut stats = SourceStats::default();

    while let Some(entry) = decoder.next_entry()? {
        stats.files += 1;
        stats.chunks += entry.chunks.len() as u64;

        for record in entry.into_records() {
            if tx.send(record).is_err() {
                debug!("Writer hung up, stopping decoder");
                return Ok(stats);
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CanonicalReader;
    use crate::record::{ChunkRecord, FileEntry, FileRecord};
    use std::io::Cursor;

    /// Decoder replaying a fixed list, optionally failing at the end
    struct Scripted {
        entries: Vec<FileEntry>,
        fail_at_end: bool,
    }

    impl Decoder for Scripted {
        fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError> {
            if self.entries.is_empty() {
                if self.fail_at_end {
                    return Err(DecodeError::UnexpectedEof("scripted"));
                }
                return Ok(None);
            }
            Ok(Some(self.entries.remove(0)))
        }
    }

    fn entry(name: &str, chunks: usize) -> FileEntry {
        FileEntry::new(
            FileRecord::new(name, 1, 0),
            (0..chunks)
                .map(|i| ChunkRecord::new(vec![i as u8; 10], i as u32))
                .collect(),
        )
    }

    #[test]
    fn test_pipeline_preserves_order() {
        let decoder = Scripted {
            entries: vec![entry("a", 2), entry("b", 0), entry("c", 3)],
            fail_at_end: false,
        };
        let mut writer = RecordWriter::new(Vec::new());
        let stats = decode_into(decoder, &mut writer).unwrap();
        assert_eq!(stats, SourceStats { files: 3, chunks: 5 });
        assert_eq!(writer.records_written(), 8);

        let bytes = writer.finish().unwrap();
        let names: Vec<Vec<u8>> = CanonicalReader::new(Cursor::new(bytes))
            .map(|e| e.unwrap().file.filename)
            .collect();
        assert_eq!(names, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_pipeline_reports_decode_failure_after_writing() {
        let decoder = Scripted {
            entries: vec![entry("a", 1)],
            fail_at_end: true,
        };
        let mut writer = RecordWriter::new(Vec::new());
        let result = decode_into(decoder, &mut writer);
        assert!(matches!(result, Err(PipelineError::Decode(_))));
        assert_eq!(writer.records_written(), 2);
    }
}
