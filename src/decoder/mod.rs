//! Source trace decoders.
//!
//! Every source encoding implements [`Decoder`]: produce the next file entry,
//! signal the end of input with `Ok(None)`, or fail with a fatal
//! [`DecodeError`]. Malformed records are recovered (and logged) inside the
//! decoders themselves.

pub mod canonical;
pub mod legacy;
pub mod ubc;

pub use canonical::CanonicalDecoder;
pub use legacy::LegacyDecoder;
pub use ubc::UbcDecoder;

use crate::record::FileEntry;
use crate::utils::config::READER_BUFFER_SIZE;
use crate::utils::error::DecodeError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A source of canonical file entries
pub trait Decoder {
    /// Decode the next file entry
    fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError> {
        (**self).next_entry()
    }
}

/// On-disk encoding of a source trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Fixed-width binary records with a sentinel terminator
    Legacy,
    /// Multi-line human-readable per-host dumps
    #[default]
    Ubc,
    /// Length-prefixed canonical records
    Canonical,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Legacy => "legacy",
            SourceFormat::Ubc => "ubc",
            SourceFormat::Canonical => "canonical",
        };
        f.write_str(name)
    }
}

/// Open `path` with the decoder for `format`
///
/// **Public** - used by conversion jobs
///
/// # Errors
/// * `DecodeError::Io` - the file cannot be opened
pub fn open_decoder(
    format: SourceFormat,
    path: impl AsRef<Path>,
) -> Result<Box<dyn Decoder + Send>, DecodeError> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(READER_BUFFER_SIZE, file);

    Ok(match format {
        SourceFormat::Legacy => Box::new(LegacyDecoder::new(reader)),
        SourceFormat::Ubc => Box::new(UbcDecoder::new(reader)),
        SourceFormat::Canonical => Box::new(CanonicalDecoder::new(reader)),
    })
}

/// Drain a decoder into memory
///
/// **Public** - convenient for small inputs and tests
pub fn decode_all<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Vec<FileEntry>, DecodeError> {
    let mut entries = Vec::new();
    while let Some(entry) = decoder.next_entry()? {
        entries.push(entry);
    }
    Ok(entries)
}
