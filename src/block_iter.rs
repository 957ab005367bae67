// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Block iterator: a forward cursor over a `BlockList`
//! that materializes blocks lazily (via the list's own per-block cache) and,
//! for delta-encoded lists, implements `advance_to`/`next_ge` using the
//! block upper-bound table to skip whole blocks without decoding them.

use crate::blocklist::BlockList;
use crate::codec::IntCodec;
use crate::error::Result;

/// Cursor state is `(block_index, offset_in_block)`. The end sentinel is
/// `(length / block_size, length % block_size)`: a block list whose length
/// divides the block size evenly ends one
/// block past the last; a list with a partial last block ends at that
/// block's length as an offset.
#[derive(Clone, Copy)]
pub struct BlockCursor<'a, 'b, C: IntCodec, const DELTA: bool> {
    list: &'b BlockList<'a, C, DELTA>,
    block_index: usize,
    offset: usize,
}

impl<'a, 'b, C: IntCodec, const DELTA: bool> BlockCursor<'a, 'b, C, DELTA> {
    pub fn new(list: &'b BlockList<'a, C, DELTA>) -> Self {
        BlockCursor {
            list,
            block_index: 0,
            offset: 0,
        }
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn end_state(&self) -> (usize, usize) {
        let b = self.list.block_size() as usize;
        let len = self.list.len() as usize;
        (len / b, len % b)
    }

    pub fn is_end(&self) -> bool {
        (self.block_index, self.offset) == self.end_state()
    }

    /// Value at the current position, or `None` at the end.
    pub fn current(&self) -> Result<Option<u32>> {
        if self.is_end() {
            return Ok(None);
        }
        let block = self.list.block(self.block_index)?;
        Ok(Some(block[self.offset]))
    }

    /// `offset++`; if `offset` reaches the block size, move to the next
    /// block and reset. A no-op past the end.
    pub fn advance(&mut self) {
        if self.is_end() {
            return;
        }
        self.offset += 1;
        if self.offset == self.list.block_size() as usize {
            self.block_index += 1;
            self.offset = 0;
        }
    }

    /// Jump directly to an arbitrary `(block_index, offset)` pair, used by
    /// `PostingListView` to align a payload cursor to a document cursor's
    /// position after the latter's `advance_to`.
    pub fn seek_exact(&mut self, block_index: usize, offset: usize) {
        self.block_index = block_index;
        self.offset = offset;
    }

    /// Skip forward to the first value `>= v`, using the upper-bound table
    /// to skip whole blocks. Only meaningful for delta (document) lists.
    pub fn advance_to(&mut self, v: u32) -> Result<()> {
        debug_assert!(DELTA, "advance_to is only meaningful for document lists");
        if self.is_end() {
            return Ok(());
        }
        let upper_bounds = self.list.upper_bounds();
        let rel = upper_bounds[self.block_index..].partition_point(|&ub| ub < v);
        let target_block = self.block_index + rel;

        if target_block >= self.list.block_count() {
            let (end_block, end_offset) = self.end_state();
            self.block_index = end_block;
            self.offset = end_offset;
            return Ok(());
        }

        if target_block != self.block_index {
            self.block_index = target_block;
            self.offset = 0;
        }

        let block = self.list.block(self.block_index)?;
        let start = self.offset;
        let pos = block[start..].partition_point(|&x| x < v);
        self.offset = start + pos;
        Ok(())
    }

    /// Non-mutating `advance_to`: returns a new cursor positioned at the
    /// first value `>= v`.
    pub fn next_ge(&self, v: u32) -> Result<Self> {
        let mut copy = *self;
        copy.advance_to(v)?;
        Ok(copy)
    }
}

impl<'a, 'b, C: IntCodec, const DELTA: bool> PartialEq for BlockCursor<'a, 'b, C, DELTA> {
    fn eq(&self, other: &Self) -> bool {
        self.block_index == other.block_index && self.offset == other.offset
    }
}

impl<'a, 'b, C: IntCodec, const DELTA: bool> Iterator for BlockCursor<'a, 'b, C, DELTA> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current() {
            Ok(Some(v)) => {
                self.advance();
                Some(Ok(v))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
