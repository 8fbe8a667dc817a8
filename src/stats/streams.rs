//! Stream skewness: the number of distinct chunks that occur in exactly N
//! streams.
//!
//! The stream of a traced file is the base name of its filename, so the same
//! checkpoint traced on different days or hosts counts as one stream.

use super::{chunk_key, for_each_entry, StatsOptions};
use crate::utils::error::StatsError;
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Per-stream tally of one chunk
#[derive(Debug, Clone, Copy, Default)]
struct StreamTally {
    occurrences: u64,
    volume: u64,
}

/// Totals for all chunks shared by the same number of streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamBucket {
    /// Distinct chunks in this bucket
    pub chunks: u64,
    /// Every occurrence of those chunks
    pub occurrences: u64,
    /// Combined size of every occurrence
    pub volume: u64,
}

/// Result of a stream skewness pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// stream count -> bucket
    pub buckets: BTreeMap<usize, StreamBucket>,
    pub streams: usize,
}

impl StreamReport {
    /// CSV lines `N,chunks,occurrences,volume`, ascending by N
    pub fn csv_lines(&self) -> Vec<String> {
        self.buckets
            .iter()
            .map(|(n, b)| format!("{},{},{},{}", n, b.chunks, b.occurrences, b.volume))
            .collect()
    }
}

/// Stream id of a traced filename: everything after the last `/`,
/// ignoring trailing slashes
pub fn stream_id(filename: &[u8]) -> &[u8] {
    let end = filename
        .iter()
        .rposition(|b| *b != b'/')
        .map_or(0, |last| last + 1);
    let trimmed = &filename[..end];
    match trimmed.iter().rposition(|b| *b == b'/') {
        Some(slash) => &trimmed[slash + 1..],
        None => trimmed,
    }
}

/// Compute stream skewness over all `traces`
///
/// **Public** - used by the `streams` command
///
/// # Errors
/// * `StatsError::Trace` - a trace cannot be opened or is malformed
pub fn compute_stream_skewness(
    traces: &[PathBuf],
    options: &StatsOptions,
) -> Result<StreamReport, StatsError> {
    let mut index: HashMap<Vec<u8>, HashMap<Vec<u8>, StreamTally>> = HashMap::new();

    for_each_entry(traces, options, |_, entry| {
        let stream = stream_id(&entry.file.filename);
        for chunk in &entry.chunks {
            let tally = index
                .entry(chunk_key(&chunk.fingerprint, options.key_width))
                .or_default()
                .entry(stream.to_vec())
                .or_default();
            tally.occurrences += 1;
            tally.volume += u64::from(chunk.size);
        }
    })?;

    let mut buckets: BTreeMap<usize, StreamBucket> = BTreeMap::new();
    let mut streams = std::collections::HashSet::new();
    for per_stream in index.values() {
        let bucket = buckets.entry(per_stream.len()).or_default();
        bucket.chunks += 1;
        for (stream, tally) in per_stream {
            bucket.occurrences += tally.occurrences;
            bucket.volume += tally.volume;
            streams.insert(stream.as_slice());
        }
    }

    info!(
        "{} distinct chunks across {} streams",
        index.len(),
        streams.len()
    );
    Ok(StreamReport {
        buckets,
        streams: streams.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::write_trace;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stream_id_is_base_name() {
        assert_eq!(stream_id(b"/ckpt/day1/1234.dmtcp"), b"1234.dmtcp");
        assert_eq!(stream_id(b"1234.dmtcp"), b"1234.dmtcp");
        assert_eq!(stream_id(b"/ckpt/day1/"), b"day1");
        assert_eq!(stream_id(b"/ckpt/caf\xe9"), b"caf\xe9");
    }

    #[test]
    fn test_stream_skewness_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let day1 = dir.path().join("day1");
        let day2 = dir.path().join("day2");
        write_trace(
            &day1,
            &[
                ("/a/1234.dmtcp", vec![(b"A".to_vec(), 10), (b"B".to_vec(), 5)]),
                ("/a/4321.dmtcp", vec![(b"A".to_vec(), 10)]),
            ],
        );
        // Same stream as day 1 under another directory
        write_trace(&day2, &[("/b/1234.dmtcp", vec![(b"B".to_vec(), 5), (b"C".to_vec(), 7)])]);

        let report = compute_stream_skewness(&[day1, day2], &StatsOptions::default()).unwrap();
        // A: 2 streams, 2 occurrences, 20 bytes. B: 1 stream, 2 occurrences, 10 bytes. C: 1 stream.
        assert_eq!(report.csv_lines(), vec!["1,2,3,17", "2,1,2,20"]);
        assert_eq!(report.streams, 2);
    }

    #[test]
    fn test_empty_traces_give_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("empty");
        write_trace(&trace, &[]);

        let report = compute_stream_skewness(&[trace], &StatsOptions::default()).unwrap();
        assert!(report.csv_lines().is_empty());
    }
}
