// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Memory view: a uniform read-only byte window over owned buffers, borrowed
//! slices, and memory-mapped files.
//!
//! Every block list (`blocklist.rs`) borrows from one of these; slicing is
//! O(1) and never copies -- `Owned` and `Mapped` keep one shared backing
//! allocation per source and track a byte range into it, so walking a
//! posting list never allocates beyond the per-block decode buffer.

use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::{IndexError, Result};

/// A read-only byte window. Cloning is O(1): `Owned` and `Mapped` share their
/// backing allocation via `Arc` plus a byte range; `Borrowed` is a plain
/// slice with a lifetime.
#[derive(Clone)]
pub enum MemoryView<'a> {
    Owned(Arc<[u8]>, Range<usize>),
    Borrowed(&'a [u8]),
    Mapped(Arc<Mmap>, Range<usize>),
}

impl<'a> MemoryView<'a> {
    pub fn owned(bytes: Vec<u8>) -> Self {
        let arc: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
        let len = arc.len();
        MemoryView::Owned(arc, 0..len)
    }

    pub fn borrowed(bytes: &'a [u8]) -> Self {
        MemoryView::Borrowed(bytes)
    }

    /// Memory-map `path` read-only. The mapping is immediately dropped if
    /// the file is empty, since `Mmap::map` rejects zero-length files.
    pub fn mapped(path: &Path) -> Result<MemoryView<'static>> {
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        let len = file.metadata().map_err(|e| IndexError::io(path, e))?.len();
        if len == 0 {
            return Ok(MemoryView::owned(Vec::new()));
        }
        // SAFETY: the index directory is never written to while a reader
        // holds it open (writers and readers on the same directory don't
        // overlap); the mapping is read-only for the view's entire lifetime.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| IndexError::io(path, e))?;
        let len = mmap.len();
        Ok(MemoryView::Mapped(Arc::new(mmap), 0..len))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MemoryView::Owned(buf, range) => &buf[range.clone()],
            MemoryView::Borrowed(buf) => buf,
            MemoryView::Mapped(mmap, range) => &mmap[range.clone()],
        }
    }

    pub fn size(&self) -> usize {
        self.as_bytes().len()
    }

    /// Slice `[lo, hi)` of this view. O(1): shares the same backing
    /// allocation, narrowing only the tracked range.
    pub fn slice(&self, lo: usize, hi: usize) -> MemoryView<'a> {
        assert!(lo <= hi && hi <= self.size(), "slice out of bounds");
        match self {
            MemoryView::Owned(buf, range) => {
                MemoryView::Owned(buf.clone(), range.start + lo..range.start + hi)
            }
            MemoryView::Borrowed(buf) => MemoryView::Borrowed(&buf[lo..hi]),
            MemoryView::Mapped(mmap, range) => {
                MemoryView::Mapped(mmap.clone(), range.start + lo..range.start + hi)
            }
        }
    }

    /// Unaligned typed read of a little-endian `u32` at the start of this view.
    pub fn read_u32(&self) -> Result<u32> {
        let bytes = self.as_bytes();
        if bytes.len() < 4 {
            return Err(IndexError::malformed("memory view too short for u32 read"));
        }
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.as_bytes().iter()
    }
}

impl<'a> std::ops::Index<usize> for MemoryView<'a> {
    type Output = u8;
    fn index(&self, idx: usize) -> &u8 {
        &self.as_bytes()[idx]
    }
}
