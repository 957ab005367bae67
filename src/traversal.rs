// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! TAAT / DAAT query traversal. Both paths are
//! parameterized over a small `TermCursor` capability -- `current` (forward)
//! plus `advance` -- so they work identically over synthetic postings (unit
//! tests) and over postings read from a real index and scored on the fly.

use crate::codec::IntCodec;
use crate::error::Result;
use crate::posting::PostingCursor;
use crate::scoring::{CollectionStats, ScorerKind, TermStats};
use crate::table::FixedWidthTable;
use crate::topk::TopK;

/// A forward cursor over one query term's scored postings: `(document,
/// score)` pairs in increasing document order.
pub trait TermCursor {
    fn current(&self) -> Result<Option<(u32, f64)>>;
    fn advance(&mut self);
}

/// A cursor over postings supplied directly as `(document, score)` pairs,
/// already sorted by document id. Used for tests and for any caller that
/// has pre-scored postings in memory without going through a `BlockList`.
pub struct VecTermCursor {
    postings: Vec<(u32, f64)>,
    pos: usize,
}

impl VecTermCursor {
    pub fn new(postings: Vec<(u32, f64)>) -> Self {
        debug_assert!(
            postings.windows(2).all(|w| w[0].0 < w[1].0),
            "postings must be sorted by strictly increasing document id"
        );
        VecTermCursor { postings, pos: 0 }
    }
}

impl TermCursor for VecTermCursor {
    fn current(&self) -> Result<Option<(u32, f64)>> {
        Ok(self.postings.get(self.pos).copied())
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// How a posting's stored payload becomes a score.
pub enum PayloadMode<'t> {
    /// The payload is already a (possibly quantized) score.
    Prescored,
    /// The payload is a raw term frequency; score it on the fly.
    OnTheFly {
        scorer: ScorerKind,
        term: TermStats,
        collection: CollectionStats,
        doc_lengths: &'t FixedWidthTable<u32>,
    },
}

/// A `TermCursor` backed by a real posting-list view, scoring either
/// pre-scored payloads or raw frequencies depending on `mode`.
pub struct IndexTermCursor<'a, 'b, 't, C: IntCodec> {
    cursor: PostingCursor<'a, 'b, C>,
    mode: PayloadMode<'t>,
}

impl<'a, 'b, 't, C: IntCodec> IndexTermCursor<'a, 'b, 't, C> {
    pub fn new(cursor: PostingCursor<'a, 'b, C>, mode: PayloadMode<'t>) -> Self {
        IndexTermCursor { cursor, mode }
    }
}

impl<'a, 'b, 't, C: IntCodec> TermCursor for IndexTermCursor<'a, 'b, 't, C> {
    fn current(&self) -> Result<Option<(u32, f64)>> {
        let posting = match self.cursor.current()? {
            Some(p) => p,
            None => return Ok(None),
        };
        let score = match &self.mode {
            PayloadMode::Prescored => posting.payload() as f64,
            PayloadMode::OnTheFly {
                scorer,
                term,
                collection,
                doc_lengths,
            } => {
                let tf = posting.payload() as f64;
                let dl = doc_lengths.get(posting.document() as usize).unwrap_or(0) as f64;
                scorer.score(tf, dl, *term, *collection)
            }
        };
        Ok(Some((posting.document(), score)))
    }

    fn advance(&mut self) {
        self.cursor.advance();
    }
}

/// Term-at-a-time: a dense accumulator of length `n_docs`, one pass per
/// term, then a scan into the top-k aggregator.
pub fn taat(terms: &mut [Box<dyn TermCursor + '_>], n_docs: usize, k: usize) -> Result<Vec<(u32, f64)>> {
    let mut acc = vec![0.0f64; n_docs];
    let mut touched = vec![false; n_docs];

    for cursor in terms.iter_mut() {
        while let Some((doc, score)) = cursor.current()? {
            let idx = doc as usize;
            acc[idx] += score;
            touched[idx] = true;
            cursor.advance();
        }
    }

    let mut topk = TopK::new(k);
    for (doc, &was_touched) in touched.iter().enumerate() {
        if was_touched {
            topk.offer(doc as u32, acc[doc]);
        }
    }
    Ok(topk.sorted())
}

/// Document-at-a-time: advance a frontier across all cursors, accumulating
/// every cursor currently parked on the frontier document before moving on.
pub fn daat(terms: &mut [Box<dyn TermCursor + '_>], k: usize) -> Result<Vec<(u32, f64)>> {
    let mut topk = TopK::new(k);

    loop {
        let mut frontier: Option<u32> = None;
        for cursor in terms.iter() {
            if let Some((doc, _)) = cursor.current()? {
                frontier = Some(frontier.map_or(doc, |f| f.min(doc)));
            }
        }
        let Some(frontier) = frontier else {
            break;
        };

        let mut accumulated = 0.0;
        for cursor in terms.iter_mut() {
            if let Some((doc, score)) = cursor.current()? {
                if doc == frontier {
                    accumulated += score;
                    cursor.advance();
                }
            }
        }
        topk.offer(frontier, accumulated);
    }

    Ok(topk.sorted())
}
