// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Block list: the on-disk format for one term's inverted list.
//!
//! Layout:
//!
//! ```text
//! | list_byte_size : vbyte |
//! | block_size     : vbyte |
//! | block_count    : vbyte |
//! | skips          : vbyte-delta[K] |          (absolute byte offsets, delta-coded on disk)
//! | [delta only] upper_bounds : svb-delta[K] |  (last doc id of each block)
//! | block_0_bytes | block_1_bytes | ... | block_{K-1}_bytes |
//! ```
//!
//! Blocks are always stream-vbyte; only the header, skip table, and
//! upper-bound table ever use plain vbyte. The skip table is stored
//! delta-coded (offsets are monotonic, so this compresses well) and
//! decoded back into absolute offsets on load -- the on-disk bytes are
//! the same ones a per-block size table would produce, but callers see
//! the declared contract (absolute byte offsets) rather than the
//! encoding trick used to store them compactly.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::codec::{decode_varint_u64, encode_varint_u64, IntCodec, StreamVbyte, Vbyte};
use crate::error::{IndexError, Result};
use crate::memview::MemoryView;

/// A parsed block list. `DELTA` selects document-id semantics (gap coded,
/// upper-bound table present) versus payload semantics (plain, no upper
/// bounds). `C` is the codec used to encode/decode block contents.
pub struct BlockList<'a, C: IntCodec, const DELTA: bool> {
    length: u32,
    block_size: u32,
    skips: Vec<u32>,
    upper_bounds: Vec<u32>,
    data: MemoryView<'a>,
    cache: RefCell<Vec<Option<Vec<u32>>>>,
    _codec: PhantomData<C>,
}

/// Document-id list: strictly increasing, delta-coded, upper-bound skip table.
pub type DeltaBlockList<'a, C> = BlockList<'a, C, true>;
/// Payload/score list: non-negative, plain-coded, shares the document
/// list's skip structure but carries no upper bounds of its own.
pub type FlatBlockList<'a, C> = BlockList<'a, C, false>;

impl<'a, C: IntCodec, const DELTA: bool> BlockList<'a, C, DELTA> {
    /// Parse a block list from its encoded memory window.
    pub fn from_memory(memory: MemoryView<'a>) -> Result<Self> {
        let bytes = memory.as_bytes();
        let (list_byte_size, mut pos) = decode_varint_u64(bytes)?;
        if list_byte_size as usize != bytes.len() {
            return Err(IndexError::malformed(format!(
                "block list size {} does not match memory view size {}",
                list_byte_size,
                bytes.len()
            )));
        }

        let (block_size, consumed) = decode_varint_u64(&bytes[pos..])?;
        pos += consumed;
        let (block_count, consumed) = decode_varint_u64(&bytes[pos..])?;
        pos += consumed;
        let block_count = block_count as usize;

        let mut deltas = Vec::with_capacity(block_count);
        pos += Vbyte::delta_decode(&bytes[pos..], &mut deltas, block_count, 0)?;
        let skips = deltas;

        let mut upper_bounds = Vec::new();
        if DELTA {
            pos += StreamVbyte::delta_decode(&bytes[pos..], &mut upper_bounds, block_count, 0)?;
            for w in upper_bounds.windows(2) {
                if w[1] < w[0] {
                    return Err(IndexError::malformed(
                        "block list upper-bound table is not monotonic",
                    ));
                }
            }
        }

        let data = memory.slice(pos, bytes.len());

        Ok(BlockList {
            length: 0, // filled in by caller via `with_length`; see note below
            block_size: block_size as u32,
            skips,
            upper_bounds,
            data,
            cache: RefCell::new(vec![None; block_count]),
            _codec: PhantomData,
        })
    }

    /// Block lists don't self-report their logical element count (only
    /// their byte size and block layout); the caller supplies it from the
    /// companion document-frequency / term-occurrence stream.
    pub fn with_length(mut self, length: u32) -> Result<Self> {
        let block_count = self.block_count();
        if length == 0 && block_count != 0 {
            return Err(IndexError::malformed("zero-length list with nonzero blocks"));
        }
        if block_count > 0 {
            let max = self.block_size as u64 * block_count as u64;
            let min = self.block_size as u64 * (block_count as u64 - 1);
            if (length as u64) > max || (length as u64) <= min {
                return Err(IndexError::malformed(format!(
                    "length {} inconsistent with block_size {} and block_count {}",
                    length, self.block_size, block_count
                )));
            }
        }
        self.length = length;
        Ok(self)
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.skips.len()
    }

    /// Number of logical values in block `n`: `block_size` for every block
    /// but the last, which holds `length mod block_size` (or a full block
    /// if the length divides evenly).
    pub fn block_len(&self, n: usize) -> usize {
        let block_count = self.block_count();
        if n < block_count - 1 {
            self.block_size as usize
        } else {
            (self.length as usize) - (block_count - 1) * self.block_size as usize
        }
    }

    pub fn upper_bounds(&self) -> &[u32] {
        &self.upper_bounds
    }

    fn block_bytes(&self, n: usize) -> &[u8] {
        let start = self.skips[n] as usize;
        let end = if n + 1 < self.skips.len() {
            self.skips[n + 1] as usize
        } else {
            self.data.size()
        };
        &self.data.as_bytes()[start..end]
    }

    /// Decode block `n`, caching the result so repeated passes don't re-decode.
    pub fn block(&self, n: usize) -> Result<std::cell::Ref<'_, [u32]>> {
        {
            let cache = self.cache.borrow();
            if cache[n].is_some() {
                drop(cache);
                return Ok(std::cell::Ref::map(self.cache.borrow(), |c| {
                    c[n].as_deref().unwrap()
                }));
            }
        }
        let count = self.block_len(n);
        let bytes = self.block_bytes(n);
        let mut values = Vec::with_capacity(count);
        if DELTA {
            let seed = if n > 0 { self.upper_bounds[n - 1] } else { 0 };
            C::delta_decode(bytes, &mut values, count, seed)?;
        } else {
            C::decode(bytes, &mut values, count)?;
        }
        self.cache.borrow_mut()[n] = Some(values);
        Ok(std::cell::Ref::map(self.cache.borrow(), |c| {
            c[n].as_deref().unwrap()
        }))
    }
}

/// Accumulates values for one list, then writes the block-list format at
/// flush. `C` is the codec used for block contents.
pub struct BlockListBuilder<C: IntCodec, const DELTA: bool> {
    block_size: u32,
    values: Vec<u32>,
    _codec: PhantomData<C>,
}

impl<C: IntCodec, const DELTA: bool> BlockListBuilder<C, DELTA> {
    pub fn new(block_size: u32) -> Self {
        assert!(block_size > 0, "block_size must be positive");
        BlockListBuilder {
            block_size,
            values: Vec::new(),
            _codec: PhantomData,
        }
    }

    pub fn add(&mut self, value: u32) {
        if DELTA {
            debug_assert!(
                self.values.last().is_none_or(|&last| value > last),
                "document ids must be strictly increasing"
            );
        }
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Self-consistency padding for `list_byte_size`: the size field must
    /// account for the fact that a larger size may itself need more vbyte
    /// bytes to encode.
    fn expanded_size(list_byte_size: usize) -> usize {
        let mut extra_bytes: u32 = 1;
        while (list_byte_size as u64 + extra_bytes as u64) >= (1u64 << (extra_bytes * 7)) {
            extra_bytes += 1;
        }
        list_byte_size + extra_bytes as usize
    }

    /// Encode the accumulated values into the block-list byte format.
    pub fn encode(&self) -> Vec<u8> {
        let block_size = self.block_size as usize;
        let block_count = self.values.len().div_ceil(block_size).max(if self.values.is_empty() {
            0
        } else {
            1
        });

        let mut absolute_offsets = Vec::with_capacity(block_count);
        let mut upper_bounds = Vec::with_capacity(block_count);
        let mut encoded_blocks = Vec::new();
        let mut previous_last = 0u32;

        for chunk in self.values.chunks(block_size.max(1)) {
            absolute_offsets.push(encoded_blocks.len() as u32);
            if DELTA {
                C::delta_encode(chunk, previous_last, &mut encoded_blocks);
                previous_last = *chunk.last().unwrap();
                upper_bounds.push(previous_last);
            } else {
                C::encode(chunk, &mut encoded_blocks);
            }
        }

        let mut encoded_skips = Vec::new();
        Vbyte::delta_encode(&absolute_offsets, 0, &mut encoded_skips);

        let mut encoded_upper_bounds = Vec::new();
        if DELTA {
            StreamVbyte::delta_encode(&upper_bounds, 0, &mut encoded_upper_bounds);
        }

        let mut encoded_header = Vec::new();
        encode_varint_u64(block_size as u64, &mut encoded_header);
        encode_varint_u64(block_count as u64, &mut encoded_header);

        let body_len = encoded_header.len()
            + encoded_skips.len()
            + encoded_upper_bounds.len()
            + encoded_blocks.len();
        let list_byte_size = Self::expanded_size(body_len);

        let mut out = Vec::with_capacity(list_byte_size + 5);
        encode_varint_u64(list_byte_size as u64, &mut out);
        out.extend_from_slice(&encoded_header);
        out.extend_from_slice(&encoded_skips);
        out.extend_from_slice(&encoded_upper_bounds);
        out.extend_from_slice(&encoded_blocks);
        out
    }
}
