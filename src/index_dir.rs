// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! On-disk layout: the file table for one index
//! directory, plus the atomic write-then-rename discipline every offline
//! writer (assembler batch, merger, scoring pass) follows.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::error::{IndexError, Result};
use crate::memview::MemoryView;

static TMP_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Owns one index directory and exposes typed open/read/write accessors for
/// the named artifacts in this file table. Readers and
/// writers never overlap on the same directory.
#[derive(Debug, Clone)]
pub struct IndexDir {
    path: PathBuf,
}

impl IndexDir {
    /// Open an existing directory for reading. Does not validate that any
    /// particular artifact is present -- individual accessors report
    /// `MissingArtifact` lazily, matching the propagation policy in §7.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(IndexError::MissingArtifact(path));
        }
        Ok(IndexDir { path })
    }

    /// Create (or reuse) a directory for writing.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| IndexError::io(path, e))?;
        Ok(IndexDir {
            path: path.to_path_buf(),
        })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexError::MissingArtifact(path.clone())
            } else {
                IndexError::io(path, e)
            }
        })
    }

    /// Memory-map the named file for zero-copy reads.
    pub fn mmap(&self, name: &str) -> Result<MemoryView<'static>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(IndexError::MissingArtifact(path));
        }
        MemoryView::mapped(&path)
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bytes = self.read_bytes(name)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::malformed(format!("invalid JSON in {name}: {e}")))
    }

    /// Read a newline-delimited text artifact (`terms.txt`, `titles.txt`)
    /// into one `String` per line. An empty or absent-but-optional file
    /// yields an empty `Vec` rather than a one-element `Vec` of `""`.
    pub fn read_lines(&self, name: &str) -> Result<Vec<String>> {
        let bytes = self.read_bytes(name)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| IndexError::malformed(format!("{name} is not valid UTF-8: {e}")))?;
        if text.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(text.lines().map(str::to_string).collect())
        }
    }

    /// Write `bytes` to `<name>`, atomically: the data lands at
    /// `<name>.tmp-<pid>-<counter>` first, then is renamed into place. A
    /// write that fails partway leaves the previous artifact (or nothing,
    /// on first build) untouched.
    #[instrument(skip(self, bytes), fields(name, bytes = bytes.len()))]
    pub fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let final_path = self.path_for(name);
        let tmp_name = format!(
            "{name}.tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let tmp_path = self.path_for(&tmp_name);
        fs::write(&tmp_path, bytes).map_err(|e| IndexError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| IndexError::io(&final_path, e))?;
        Ok(())
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| IndexError::malformed(format!("failed to serialize {name}: {e}")))?;
        self.write_atomic(name, &bytes)
    }
}
