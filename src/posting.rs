// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Posting-list view: zips a document list (delta-coded)
//! and a payload list (plain) of equal length, presenting a single iterator
//! over `(document, payload)` pairs with a `lookup`/skip primitive.

use crate::block_iter::BlockCursor;
use crate::blocklist::{DeltaBlockList, FlatBlockList};
use crate::codec::IntCodec;
use crate::error::{IndexError, Result};

/// One posting: a document id paired with its payload (raw frequency or a
/// quantized score, depending on which list this view wraps).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    document: u32,
    payload: u32,
}

impl Posting {
    pub fn document(&self) -> u32 {
        self.document
    }

    pub fn payload(&self) -> u32 {
        self.payload
    }
}

impl From<Posting> for (u32, u32) {
    fn from(p: Posting) -> (u32, u32) {
        (p.document, p.payload)
    }
}

/// Pairs a document block list with a payload block list of the same
/// length and block size.
pub struct PostingListView<'a, C: IntCodec> {
    documents: DeltaBlockList<'a, C>,
    payloads: FlatBlockList<'a, C>,
}

impl<'a, C: IntCodec> PostingListView<'a, C> {
    pub fn new(documents: DeltaBlockList<'a, C>, payloads: FlatBlockList<'a, C>) -> Result<Self> {
        if documents.len() != payloads.len() {
            return Err(IndexError::malformed(format!(
                "document list length {} does not match payload list length {}",
                documents.len(),
                payloads.len()
            )));
        }
        if documents.block_size() != payloads.block_size() {
            return Err(IndexError::malformed(
                "document and payload lists have different block sizes",
            ));
        }
        Ok(PostingListView {
            documents,
            payloads,
        })
    }

    pub fn len(&self) -> u32 {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn cursor<'b>(&'b self) -> PostingCursor<'a, 'b, C> {
        PostingCursor {
            documents: BlockCursor::new(&self.documents),
            payloads: BlockCursor::new(&self.payloads),
        }
    }

    /// First posting with `document >= d`, or `None` past the end.
    pub fn lookup(&self, d: u32) -> Result<Option<Posting>> {
        let mut cursor = self.cursor();
        cursor.advance_to(d)?;
        cursor.current()
    }
}

/// Lockstep cursor over a posting-list view's document and payload lists.
#[derive(Clone, Copy)]
pub struct PostingCursor<'a, 'b, C: IntCodec> {
    documents: BlockCursor<'a, 'b, C, true>,
    payloads: BlockCursor<'a, 'b, C, false>,
}

impl<'a, 'b, C: IntCodec> PostingCursor<'a, 'b, C> {
    pub fn is_end(&self) -> bool {
        self.documents.is_end()
    }

    pub fn current(&self) -> Result<Option<Posting>> {
        let document = match self.documents.current()? {
            Some(d) => d,
            None => return Ok(None),
        };
        let payload = self.payloads.current()?.unwrap_or(0);
        Ok(Some(Posting { document, payload }))
    }

    pub fn advance(&mut self) {
        self.documents.advance();
        self.payloads.advance();
    }

    /// Skip both cursors to the first posting with `document >= v`.
    pub fn advance_to(&mut self, v: u32) -> Result<()> {
        self.documents.advance_to(v)?;
        self.payloads
            .seek_exact(self.documents.block_index(), self.documents.offset());
        Ok(())
    }
}

impl<'a, 'b, C: IntCodec> Iterator for PostingCursor<'a, 'b, C> {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current() {
            Ok(Some(p)) => {
                self.advance();
                Some(Ok(p))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::BlockListBuilder;
    use crate::codec::StreamVbyte;
    use crate::memview::MemoryView;

    fn build_postings(
        postings: &[(u32, u32)],
        block_size: u32,
    ) -> PostingListView<'static, StreamVbyte> {
        let mut doc_builder: BlockListBuilder<StreamVbyte, true> =
            BlockListBuilder::new(block_size);
        let mut payload_builder: BlockListBuilder<StreamVbyte, false> =
            BlockListBuilder::new(block_size);
        for &(d, p) in postings {
            doc_builder.add(d);
            payload_builder.add(p);
        }
        let documents = DeltaBlockList::from_memory(MemoryView::owned(doc_builder.encode()))
            .unwrap()
            .with_length(postings.len() as u32)
            .unwrap();
        let payloads = FlatBlockList::from_memory(MemoryView::owned(payload_builder.encode()))
            .unwrap()
            .with_length(postings.len() as u32)
            .unwrap();
        PostingListView::new(documents, payloads).unwrap()
    }

    #[test]
    fn iterating_yields_document_payload_pairs_in_order() {
        let view = build_postings(&[(0, 2), (2, 1), (5, 7)], 2);
        let collected: Result<Vec<(u32, u32)>> =
            view.cursor().map(|p| p.map(Into::into)).collect();
        assert_eq!(collected.unwrap(), vec![(0, 2), (2, 1), (5, 7)]);
    }

    #[test]
    fn lookup_finds_first_document_at_or_after_probe() {
        let view = build_postings(&[(0, 2), (2, 1), (5, 7)], 2);
        assert_eq!(view.lookup(1).unwrap().map(Into::into), Some((2u32, 1u32)));
        assert_eq!(view.lookup(2).unwrap().map(Into::into), Some((2u32, 1u32)));
        assert_eq!(view.lookup(6).unwrap(), None);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut doc_builder: BlockListBuilder<StreamVbyte, true> = BlockListBuilder::new(2);
        doc_builder.add(1);
        doc_builder.add(2);
        let documents = DeltaBlockList::from_memory(MemoryView::owned(doc_builder.encode()))
            .unwrap()
            .with_length(2)
            .unwrap();

        let mut payload_builder: BlockListBuilder<StreamVbyte, false> = BlockListBuilder::new(2);
        payload_builder.add(9);
        let payloads = FlatBlockList::from_memory(MemoryView::owned(payload_builder.encode()))
            .unwrap()
            .with_length(1)
            .unwrap();

        assert!(PostingListView::new(documents, payloads).is_err());
    }
}
