//! Decoder for the verbose per-host UBC text dumps.
//!
//! A dump starts with a preamble terminated by a blank line. Each file entry
//! then looks like:
//!
//! ```text
//! 73e29ea83d:1          <- directory token
//! a7e8b0dee6:8          <- name token
//! c584233beb:0          <- extension token, also the label
//! 0                     <- skipped
//! 16                    <- file size
//! ... 7 metadata lines ...
//! SV:0                  <- optional fragmentation lines (SV:/V:/A:)
//! 2dc83032b5:204        <- chunk lines, fingerprint:size
//!                       <- blank line ends the entry
//! ```
//!
//! A line containing `LOGCOMPLETE` ends the dump.

use super::Decoder;
use crate::record::{ChunkRecord, FileEntry, FileRecord};
use crate::utils::config::{
    UBC_ENTRY_PATTERN, UBC_FRAGMENT_PREFIXES, UBC_LOG_COMPLETE, UBC_SKIPPED_META_LINES,
    UBC_ZERO_CHUNK_TOKEN, UBC_ZERO_FINGERPRINT_LEN,
};
use crate::utils::error::DecodeError;
use log::{debug, error, info};
use regex::Regex;
use std::io::BufRead;
use std::sync::OnceLock;

/// One physical line of the dump
#[derive(Debug)]
enum Line {
    /// Trimmed text
    Text(String),
    Eof,
    /// The end-of-log marker
    Complete,
}

/// Result of parsing one entry
#[derive(Debug)]
enum Parsed {
    Entry(FileEntry),
    End,
    Malformed { reason: String, at_boundary: bool },
}

impl Parsed {
    fn malformed(what: &str, line: String) -> Self {
        Parsed::Malformed {
            reason: format!("{}: {:?}", what, line),
            at_boundary: line.is_empty(),
        }
    }
}

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(UBC_ENTRY_PATTERN).expect("valid UBC entry regex"))
}

/// Streaming decoder over a UBC dump
pub struct UbcDecoder<R: BufRead> {
    reader: R,
    preamble_pending: bool,
    finished: bool,
    entries: u64,
    malformed: u64,
}

impl<R: BufRead> UbcDecoder<R> {
    /// Decoder for a full dump, preamble included
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            preamble_pending: true,
            finished: false,
            entries: 0,
            malformed: 0,
        }
    }

    /// Decoder for input that starts directly with the first entry
    pub fn headerless(reader: R) -> Self {
        Self {
            preamble_pending: false,
            ..Self::new(reader)
        }
    }

    /// Entries discarded by malformed-record recovery so far
    pub fn malformed_entries(&self) -> u64 {
        self.malformed
    }

    fn next_line(&mut self) -> Result<Line, DecodeError> {
        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(Line::Eof);
        }

        let text = String::from_utf8_lossy(&raw);
        if text.contains(UBC_LOG_COMPLETE) {
            return Ok(Line::Complete);
        }
        Ok(Line::Text(text.trim().to_string()))
    }

    /// Next line inside an entry; end of input here is a truncation
    ///
    /// **Private** - `Ok(None)` means the end-of-log marker was reached
    fn require_line(&mut self, what: &'static str) -> Result<Option<String>, DecodeError> {
        match self.next_line()? {
            Line::Text(text) => Ok(Some(text)),
            Line::Eof => Err(DecodeError::UnexpectedEof(what)),
            Line::Complete => {
                self.finished = true;
                Ok(None)
            }
        }
    }

    /// Skip everything up to and including the first blank line
    fn skip_preamble(&mut self) -> Result<(), DecodeError> {
        self.preamble_pending = false;

        // The first line is consumed even when it is blank
        if self.require_line("ubc preamble")?.is_none() {
            return Ok(());
        }
        loop {
            match self.require_line("ubc preamble")? {
                Some(line) if line.is_empty() => return Ok(()),
                Some(_) => continue,
                None => return Ok(()),
            }
        }
    }

    /// Skip the rest of a broken entry up to the next blank line
    fn resync(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.next_line()? {
                Line::Text(text) if text.is_empty() => return Ok(()),
                Line::Text(_) => continue,
                Line::Eof => return Ok(()),
                Line::Complete => {
                    self.finished = true;
                    return Ok(());
                }
            }
        }
    }

    fn parse_entry(&mut self) -> Result<Parsed, DecodeError> {
        // Blank separators between entries are tolerated
        let mut line = loop {
            match self.next_line()? {
                Line::Eof => return Ok(Parsed::End),
                Line::Complete => {
                    self.finished = true;
                    return Ok(Parsed::End);
                }
                Line::Text(text) if text.is_empty() => continue,
                Line::Text(text) => break text,
            }
        };

        let mut tokens: Vec<String> = Vec::with_capacity(3);
        loop {
            let Some(token) = header_token(&line) else {
                return Ok(Parsed::malformed("entry header", line));
            };
            tokens.push(token);
            if tokens.len() == 3 {
                break;
            }
            let Some(next) = self.require_line("ubc entry header")? else {
                return Ok(Parsed::End);
            };
            line = next;
        }

        if self.require_line("ubc entry")?.is_none() {
            return Ok(Parsed::End);
        }
        let Some(size_line) = self.require_line("ubc file size")? else {
            return Ok(Parsed::End);
        };
        let Ok(size) = size_line.parse::<u64>() else {
            return Ok(Parsed::malformed("file size", size_line));
        };

        for _ in 0..UBC_SKIPPED_META_LINES {
            if self.require_line("ubc file metadata")?.is_none() {
                return Ok(Parsed::End);
            }
        }

        // Fragmentation lines, then the first chunk line (or the blank terminator)
        let mut line = loop {
            match self.next_line()? {
                Line::Text(text) if is_fragment(&text) => continue,
                Line::Text(text) => break text,
                Line::Eof => break String::new(),
                Line::Complete => {
                    self.finished = true;
                    return Ok(Parsed::End);
                }
            }
        };

        let mut chunks = Vec::new();
        while !line.is_empty() {
            match parse_chunk_line(&line) {
                Some(chunk) => chunks.push(chunk),
                None => return Ok(Parsed::malformed("chunk line", line)),
            }
            line = match self.next_line()? {
                Line::Text(text) => text,
                Line::Eof => String::new(),
                Line::Complete => {
                    self.finished = true;
                    return Ok(Parsed::End);
                }
            };
        }

        let label = tokens[2].clone();
        let file = FileRecord {
            filename: tokens.concat().into_bytes(),
            size,
            label,
            ..Default::default()
        };
        Ok(Parsed::Entry(FileEntry::new(file, chunks)))
    }
}

impl<R: BufRead> Decoder for UbcDecoder<R> {
    fn next_entry(&mut self) -> Result<Option<FileEntry>, DecodeError> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if self.preamble_pending {
                self.skip_preamble()?;
                continue;
            }

            match self.parse_entry()? {
                Parsed::Entry(entry) => {
                    self.entries += 1;
                    return Ok(Some(entry));
                }
                Parsed::End => {
                    self.finished = true;
                    if self.malformed > 0 {
                        info!(
                            "UBC dump finished: {} entries, {} malformed entries skipped",
                            self.entries, self.malformed
                        );
                    } else {
                        debug!("UBC dump finished: {} entries", self.entries);
                    }
                    return Ok(None);
                }
                Parsed::Malformed {
                    reason,
                    at_boundary,
                } => {
                    self.malformed += 1;
                    error!("Skipping malformed UBC entry, {}", reason);
                    if !at_boundary {
                        self.resync()?;
                    }
                }
            }
        }
    }
}

/// Colon-left token of a `token:count` header line
fn header_token(line: &str) -> Option<String> {
    entry_pattern()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_fragment(line: &str) -> bool {
    UBC_FRAGMENT_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Parse `fingerprint_hex:size_decimal`
///
/// **Private** - the zero-chunk token maps to an all-zero fingerprint
fn parse_chunk_line(line: &str) -> Option<ChunkRecord> {
    let (fp, size) = line.split_once(':')?;
    if size.contains(':') {
        return None;
    }

    let fingerprint = if fp == UBC_ZERO_CHUNK_TOKEN {
        vec![0u8; UBC_ZERO_FINGERPRINT_LEN]
    } else {
        hex::decode(fp).ok()?
    };
    let size = size.parse::<u32>().ok()?;

    Some(ChunkRecord::new(fingerprint, size))
}
