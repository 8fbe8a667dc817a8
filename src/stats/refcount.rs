//! Refcount skewness: the number of distinct chunks that occur exactly N
//! times across a set of canonical traces.
//!
//! If chunks A, C and D occur twice and B once, the histogram is
//! `1 -> 1, 2 -> 3`.
//!
//! References to the all-zero and all-one chunk of the trace's chunking
//! method are counted separately so the most used chunk can be named.

use super::{chunk_key, for_each_entry, StatsOptions};
use crate::utils::config::{DEFAULT_CHUNKING_METHOD, SPECIAL_CHUNKS, SPECIAL_CHUNK_KEY_LEN};
use crate::utils::error::StatsError;
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Which well-known chunk holds the highest refcount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MostUsedChunk {
    Zero,
    One,
    #[default]
    Unknown,
}

/// Aggregate figures written next to the histogram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefcountSummary {
    pub traces: usize,
    pub files: u64,
    pub distinct_chunks: u64,
    pub total_references: u64,
    pub max_refcount: u64,

    /// References to the all-zero chunk
    pub zero_chunks: u64,
    /// References to the all-one chunk
    pub one_chunks: u64,
    pub most_used_chunk: MostUsedChunk,
}

/// Zero and one chunk keys of one chunking method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialChunks {
    pub method: &'static str,
    zero: Vec<u8>,
    one: Vec<u8>,
}

impl SpecialChunks {
    /// Keys for the first chunking method named in `trace`, `cdc8` otherwise
    ///
    /// # Errors
    /// * `StatsError::InvalidSpecialChunk` - a table key is not valid hex
    pub fn for_trace(trace: &Path) -> Result<Self, StatsError> {
        let path = trace.to_string_lossy();
        let (method, zero, one) = SPECIAL_CHUNKS
            .iter()
            .find(|(method, _, _)| path.contains(method))
            .or_else(|| SPECIAL_CHUNKS.iter().find(|(method, _, _)| *method == DEFAULT_CHUNKING_METHOD))
            .copied()
            .unwrap_or(SPECIAL_CHUNKS[0]);

        let decode = |key: &str| {
            hex::decode(key).map_err(|source| StatsError::InvalidSpecialChunk { method, source })
        };
        Ok(Self {
            method,
            zero: decode(zero)?,
            one: decode(one)?,
        })
    }

    fn matches_zero(&self, key: &[u8]) -> bool {
        key == self.zero.as_slice()
    }

    fn matches_one(&self, key: &[u8]) -> bool {
        key == self.one.as_slice()
    }
}

/// Result of a refcount pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefcountReport {
    /// refcount -> number of distinct chunks with that refcount
    pub histogram: BTreeMap<u64, u64>,
    pub summary: RefcountSummary,
}

impl RefcountReport {
    /// CSV lines `N,count`, ascending by N
    pub fn csv_lines(&self) -> Vec<String> {
        self.histogram
            .iter()
            .map(|(refcount, chunks)| format!("{},{}", refcount, chunks))
            .collect()
    }
}

/// Count chunk references over all `traces`
///
/// **Public** - used by the `refcount` command
///
/// # Errors
/// * `StatsError::Trace` - a trace cannot be opened or is malformed
pub fn compute_refcounts(traces: &[PathBuf], options: &StatsOptions) -> Result<RefcountReport, StatsError> {
    let special: HashMap<&Path, SpecialChunks> = traces
        .iter()
        .map(|trace| {
            let chunks = SpecialChunks::for_trace(trace)?;
            debug!("Using {} special chunks for {}", chunks.method, trace.display());
            Ok::<_, StatsError>((trace.as_path(), chunks))
        })
        .collect::<Result<_, _>>()?;

    let mut index: HashMap<Vec<u8>, u64> = HashMap::new();
    let mut files = 0u64;
    let (mut zero_chunks, mut one_chunks) = (0u64, 0u64);

    for_each_entry(traces, options, |trace, entry| {
        files += 1;
        let special = &special[trace];
        for chunk in &entry.chunks {
            *index.entry(chunk_key(&chunk.fingerprint, options.key_width)).or_insert(0) += 1;

            let key = chunk_key(&chunk.fingerprint, SPECIAL_CHUNK_KEY_LEN);
            if special.matches_zero(&key) {
                zero_chunks += 1;
            } else if special.matches_one(&key) {
                one_chunks += 1;
            }
        }
    })?;

    let mut histogram = BTreeMap::new();
    for refcount in index.values() {
        *histogram.entry(*refcount).or_insert(0u64) += 1;
    }

    let max_refcount = index.values().copied().max().unwrap_or(0);
    let most_used_chunk = match max_refcount {
        0 => MostUsedChunk::Unknown,
        max if max == zero_chunks => MostUsedChunk::Zero,
        max if max == one_chunks => MostUsedChunk::One,
        _ => MostUsedChunk::Unknown,
    };

    let summary = RefcountSummary {
        traces: traces.len(),
        files,
        distinct_chunks: index.len() as u64,
        total_references: index.values().sum(),
        max_refcount,
        zero_chunks,
        one_chunks,
        most_used_chunk,
    };
    info!(
        "{} distinct chunks, {} references, max refcount {} ({:?} chunk)",
        summary.distinct_chunks, summary.total_references, summary.max_refcount, summary.most_used_chunk
    );

    Ok(RefcountReport { histogram, summary })
}
