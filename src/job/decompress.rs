//! In-place decompression of workspace copies.

use crate::utils::error::JobError;
use clap::ValueEnum;
use flate2::read::GzDecoder;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// How compressed sources are unpacked inside a job workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Decompressor {
    /// Spawn an external `gzip -f -d`
    #[default]
    Gzip,
    /// Decode gzip in-process
    Builtin,
    /// Sources are already uncompressed
    Passthrough,
}

impl Decompressor {
    /// Decompress `path` in place, replacing `name.gz` with `name`
    ///
    /// **Public** - called once per source file by a conversion job
    ///
    /// # Returns
    /// Path of the uncompressed file
    ///
    /// # Errors
    /// * `JobError::Decompress` - missing `.gz` suffix, corrupt input or a
    ///   failing external process
    pub fn decompress_in_place(&self, path: &Path) -> Result<PathBuf, JobError> {
        if *self == Decompressor::Passthrough {
            return Ok(path.to_path_buf());
        }

        let target = strip_gz_suffix(path).ok_or_else(|| JobError::Decompress {
            path: path.to_path_buf(),
            reason: "expected a .gz suffix".to_string(),
        })?;

        debug!("Decompressing {} ({:?})", path.display(), self);
        match self {
            Decompressor::Gzip => run_gzip(path)?,
            Decompressor::Builtin => {
                gunzip(path, &target).map_err(|e| JobError::Decompress {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
            Decompressor::Passthrough => {}
        }

        Ok(target)
    }
}

fn strip_gz_suffix(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".gz").filter(|stem| !stem.is_empty())?;
    Some(path.with_file_name(stem))
}

fn run_gzip(path: &Path) -> Result<(), JobError> {
    let output = Command::new("gzip")
        .arg("-f")
        .arg("-d")
        .arg(path)
        .output()
        .map_err(|e| JobError::Decompress {
            path: path.to_path_buf(),
            reason: format!("cannot run gzip: {}", e),
        })?;

    if !output.status.success() {
        return Err(JobError::Decompress {
            path: path.to_path_buf(),
            reason: format!(
                "gzip exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

/// Decode `source` into `target`, then remove `source` like gzip does
fn gunzip(source: &Path, target: &Path) -> io::Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(source)?));
    let mut out = BufWriter::new(File::create(target)?);

    if let Err(e) = io::copy(&mut decoder, &mut out).and_then(|_| out.flush()) {
        drop(out);
        let _ = std::fs::remove_file(target);
        return Err(e);
    }

    std::fs::remove_file(source)
}
