// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collection properties: the summary statistics every reader loads from
//! `properties.json` before it can score anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{type, bits, min, max}` of one scorer's linear quantization, as recorded
/// in `properties.json` and used to reconstruct a `LinearQuantizer` without
/// re-running the offline scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDescriptor {
    pub kind: String,
    pub bits: u8,
    pub real_min: f64,
    pub real_max: f64,
}

/// Collection-wide properties written once by the merger and never mutated
/// afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionProperties {
    pub document_count: u32,
    pub total_occurrences: u64,
    pub average_document_length: f64,
    pub max_document_length: u32,
    pub skip_block_size: u32,
    #[serde(default)]
    pub scorers: BTreeMap<String, ScoreDescriptor>,
}

impl CollectionProperties {
    pub fn new(skip_block_size: u32) -> Self {
        CollectionProperties {
            document_count: 0,
            total_occurrences: 0,
            average_document_length: 0.0,
            max_document_length: 0,
            skip_block_size,
            scorers: BTreeMap::new(),
        }
    }

    /// Fold in one document's length, keeping the running average and max
    /// current.
    pub fn record_document(&mut self, length: u32) {
        let total_before = self.average_document_length * self.document_count as f64;
        self.document_count += 1;
        self.total_occurrences += length as u64;
        self.max_document_length = self.max_document_length.max(length);
        self.average_document_length =
            (total_before + length as f64) / self.document_count as f64;
    }
}
