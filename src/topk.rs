// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Top-k aggregator: a bounded min-heap keyed by score,
//! ties broken toward the smaller document id. Both TAAT and DAAT traversal
//! (`traversal.rs`) drain into one of these at the end of a query.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    score: f64,
    doc: u32,
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Greater is "better": higher score wins; for equal scores the smaller
    /// document id wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.doc.cmp(&self.doc))
    }
}

/// Bounded top-k accumulator. `offer` is O(log k); `sorted` drains the heap
/// in descending-score order (ties ascending doc id, per the entry order).
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry>>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        TopK {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The current kth-best score, once the heap is full; `None` while
    /// still filling. Exposed for conservative pruning in DAAT variants.
    pub fn threshold(&self) -> Option<f64> {
        if self.heap.len() < self.capacity {
            None
        } else {
            self.heap.peek().map(|Reverse(e)| e.score)
        }
    }

    pub fn offer(&mut self, doc: u32, score: f64) {
        if self.capacity == 0 {
            return;
        }
        let entry = Entry { score, doc };
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
        } else if let Some(Reverse(worst)) = self.heap.peek() {
            if entry > *worst {
                self.heap.pop();
                self.heap.push(Reverse(entry));
            }
        }
    }

    /// Drain into descending-score order (ties ascending doc id).
    pub fn sorted(self) -> Vec<(u32, f64)> {
        let mut entries: Vec<Entry> = self.heap.into_iter().map(|Reverse(e)| e).collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| (e.doc, e.score)).collect()
    }
}
