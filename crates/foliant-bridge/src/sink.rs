// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks — deliver finished PDFs to a directory or to stdout.
//
// Directory delivery is atomic: bytes go to a temporary file in the target
// directory, which is then renamed into place. A reader never sees a
// half-written PDF.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use foliant_core::error::{FoliantError, Result};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::traits::{Delivery, OutputSink};

/// Writes each delivery as a file inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    /// Sink into `directory`, which is created on first delivery.
    /// Existing files are left alone unless [`with_overwrite`](Self::with_overwrite) is set.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            overwrite: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl OutputSink for DirectorySink {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len(), dir = %self.directory.display()))]
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<Delivery> {
        let name = sanitize_filename(filename)?;
        std::fs::create_dir_all(&self.directory)?;
        let target = self.directory.join(&name);

        let mut staged = NamedTempFile::new_in(&self.directory)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;

        if self.overwrite {
            staged.persist(&target).map_err(|err| FoliantError::Io(err.error))?;
        } else {
            staged.persist_noclobber(&target).map_err(|err| {
                if err.error.kind() == io::ErrorKind::AlreadyExists {
                    FoliantError::Output(format!("{} already exists", target.display()))
                } else {
                    FoliantError::Io(err.error)
                }
            })?;
        }

        let delivery = receipt(Some(target), bytes);
        info!(path = ?delivery.path, sha256 = %delivery.sha256, "output delivered");
        Ok(delivery)
    }
}

/// Writes raw bytes to standard output, ignoring the filename.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn deliver(&self, bytes: &[u8], _filename: &str) -> Result<Delivery> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        Ok(receipt(None, bytes))
    }
}

/// Reduce a requested filename to a single safe path component.
///
/// Directory parts (either separator) are dropped, control characters become
/// `_`, and names that end up empty, `.` or `..` are rejected.
pub fn sanitize_filename(requested: &str) -> Result<String> {
    let last = requested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(FoliantError::Output(format!(
            "'{requested}' is not a usable file name"
        )));
    }
    Ok(cleaned)
}

fn receipt(path: Option<PathBuf>, bytes: &[u8]) -> Delivery {
    Delivery {
        path,
        size_bytes: bytes.len() as u64,
        sha256: hex::encode(Sha256::digest(bytes)),
        delivered_at: Utc::now(),
    }
}
