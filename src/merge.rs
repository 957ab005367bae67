// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Merger: K-way term merge across batch directories produced by the
//! assembler, with per-batch document-id rebasing and an optional policy
//! to drop singleton terms contributed by only one batch.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::blocklist::BlockListBuilder;
use crate::build::{
    read_u32_table, read_u64_table, slice_term_counts, slice_term_ids, write_u32_table,
    write_u64_table,
};
use crate::codec::{IntCodec, StreamVbyte, Vbyte};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::index_dir::IndexDir;
use crate::posting::PostingListView;
use crate::properties::CollectionProperties;

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    if text.is_empty() {
        Vec::new()
    } else {
        text.lines().map(str::to_string).collect()
    }
}

/// One open batch directory plus the cursor state the K-way merge advances.
/// The `doc.id`/`doc.count` files are loaded once up front rather than
/// reread per term.
struct BatchReader {
    terms: Vec<String>,
    doc_frequencies: Vec<u32>,
    id_bytes: Vec<u8>,
    count_bytes: Vec<u8>,
    id_offsets: Vec<u64>,
    count_offsets: Vec<u64>,
    titles: Vec<String>,
    document_lengths: Vec<u32>,
    properties: CollectionProperties,
    cursor: usize,
}

impl BatchReader {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        let dir = IndexDir::open(path)?;
        let terms = split_lines(&dir.read_bytes("terms.txt")?);

        let docfreq_bytes = dir.read_bytes("terms.docfreq")?;
        let mut doc_frequencies = Vec::with_capacity(terms.len());
        Vbyte::delta_decode(&docfreq_bytes, &mut doc_frequencies, terms.len(), 0)?;

        let id_bytes = dir.read_bytes("doc.id")?;
        let count_bytes = dir.read_bytes("doc.count")?;
        let id_offsets = read_u64_table(&dir.read_bytes("doc.idoff")?)?
            .as_slice()
            .to_vec();
        let count_offsets = read_u64_table(&dir.read_bytes("doc.countoff")?)?
            .as_slice()
            .to_vec();

        let titles = split_lines(&dir.read_bytes("titles.txt")?);
        let document_lengths = read_u32_table(&dir.read_bytes("doc.sizes")?)?
            .as_slice()
            .to_vec();
        let properties: CollectionProperties = dir.read_json("properties.json")?;

        Ok(BatchReader {
            terms,
            doc_frequencies,
            id_bytes,
            count_bytes,
            id_offsets,
            count_offsets,
            titles,
            document_lengths,
            properties,
            cursor: 0,
        })
    }

    fn current_term(&self) -> Option<&str> {
        self.terms.get(self.cursor).map(String::as_str)
    }

    /// Decode term `index`'s full posting list as `(local document, tf)`.
    fn postings(&self, index: usize) -> Result<Vec<(u32, u32)>> {
        let ids = slice_term_ids(&self.id_bytes, &self.id_offsets, &self.doc_frequencies, index)?;
        let counts = slice_term_counts(
            &self.count_bytes,
            &self.count_offsets,
            &self.doc_frequencies,
            index,
        )?;
        let view = PostingListView::new(ids, counts)?;
        view.cursor().map(|p| p.map(Into::into)).collect()
    }
}

/// K-way merges a set of batch directories into one global index directory.
pub struct Merger {
    batches: Vec<BatchReader>,
    shifts: Vec<u32>,
    config: BuildConfig,
}

impl Merger {
    pub fn new(batch_paths: &[PathBuf], config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let batches = batch_paths
            .iter()
            .map(BatchReader::open)
            .collect::<Result<Vec<_>>>()?;

        let mut shifts = Vec::with_capacity(batches.len());
        let mut running = 0u32;
        for batch in &batches {
            shifts.push(running);
            running += batch.properties.document_count;
        }

        Ok(Merger {
            batches,
            shifts,
            config,
        })
    }

    /// Run the K-way merge, writing the unified index to `output`.
    #[instrument(skip(self), fields(batches = self.batches.len()))]
    pub fn merge(mut self, output: impl AsRef<Path>) -> Result<()> {
        let out_dir = IndexDir::create(output)?;

        let mut heap: BinaryHeap<Reverse<(String, usize)>> = BinaryHeap::new();
        for (s, batch) in self.batches.iter().enumerate() {
            if let Some(term) = batch.current_term() {
                heap.push(Reverse((term.to_string(), s)));
            }
        }

        let mut merged_terms = Vec::new();
        let mut merged_doc_frequencies = Vec::new();
        let mut merged_term_occurrences = Vec::new();
        let mut id_blocks = Vec::new();
        let mut count_blocks = Vec::new();
        let mut id_offsets = Vec::new();
        let mut count_offsets = Vec::new();

        while let Some(Reverse((term, _))) = heap.pop() {
            // Drain every other heap entry for the same term string; every
            // batch currently parked on `term` contributes to this round.
            while matches!(heap.peek(), Some(Reverse((t, _))) if *t == term) {
                heap.pop();
            }
            let mut contributors: Vec<usize> = (0..self.batches.len())
                .filter(|&s| self.batches[s].current_term() == Some(term.as_str()))
                .collect();
            contributors.sort_by_key(|&s| self.shifts[s]);

            if self.config.skip_unique_singletons
                && contributors.len() == 1
                && self.batches[contributors[0]].doc_frequencies
                    [self.batches[contributors[0]].cursor]
                    == 1
            {
                for &s in &contributors {
                    advance_cursor(&mut self.batches, &mut heap, s);
                }
                continue;
            }

            let mut combined_ids = Vec::new();
            let mut combined_counts = Vec::new();
            for &s in &contributors {
                let batch = &self.batches[s];
                let term_index = batch.cursor;
                let postings = batch.postings(term_index)?;
                let shift = self.shifts[s];
                for (doc, tf) in postings {
                    combined_ids.push(doc + shift);
                    combined_counts.push(tf);
                }
            }

            merged_terms.push(term.clone());
            merged_doc_frequencies.push(combined_ids.len() as u32);
            merged_term_occurrences.push(combined_counts.iter().sum::<u32>());

            let mut id_builder: BlockListBuilder<StreamVbyte, true> =
                BlockListBuilder::new(self.config.block_size);
            let mut count_builder: BlockListBuilder<StreamVbyte, false> =
                BlockListBuilder::new(self.config.block_size);
            for &d in &combined_ids {
                id_builder.add(d);
            }
            for &c in &combined_counts {
                count_builder.add(c);
            }

            id_offsets.push(id_blocks.len() as u64);
            id_blocks.extend_from_slice(&id_builder.encode());
            count_offsets.push(count_blocks.len() as u64);
            count_blocks.extend_from_slice(&count_builder.encode());

            for &s in &contributors {
                advance_cursor(&mut self.batches, &mut heap, s);
            }
        }

        out_dir.write_atomic("terms.txt", merged_terms.join("\n").as_bytes())?;

        let mut titles = Vec::new();
        let mut document_lengths = Vec::new();
        for batch in &self.batches {
            titles.extend_from_slice(&batch.titles);
            document_lengths.extend_from_slice(&batch.document_lengths);
        }
        out_dir.write_atomic("titles.txt", titles.join("\n").as_bytes())?;
        out_dir.write_atomic("doc.sizes", &write_u32_table(&document_lengths))?;

        let mut docfreq_bytes = Vec::new();
        Vbyte::delta_encode(&merged_doc_frequencies, 0, &mut docfreq_bytes);
        out_dir.write_atomic("terms.docfreq", &docfreq_bytes)?;

        let mut term_occurrences_bytes = Vec::new();
        Vbyte::delta_encode(&merged_term_occurrences, 0, &mut term_occurrences_bytes);
        out_dir.write_atomic("term.occurrences", &term_occurrences_bytes)?;

        out_dir.write_atomic("doc.id", &id_blocks)?;
        out_dir.write_atomic("doc.idoff", &write_u64_table(&id_offsets))?;
        out_dir.write_atomic("doc.count", &count_blocks)?;
        out_dir.write_atomic("doc.countoff", &write_u64_table(&count_offsets))?;

        let properties = merge_properties(&self.batches);
        out_dir.write_json("properties.json", &properties)?;

        info!(
            documents = properties.document_count,
            terms = merged_terms.len(),
            batches = self.batches.len(),
            "merged index"
        );

        Ok(())
    }
}

fn advance_cursor(batches: &mut [BatchReader], heap: &mut BinaryHeap<Reverse<(String, usize)>>, s: usize) {
    batches[s].cursor += 1;
    if let Some(next) = batches[s].current_term() {
        heap.push(Reverse((next.to_string(), s)));
    }
}

fn merge_properties(batches: &[BatchReader]) -> CollectionProperties {
    let block_size = batches
        .first()
        .map(|b| b.properties.skip_block_size)
        .unwrap_or(0);
    let mut merged = CollectionProperties::new(block_size);
    for batch in batches {
        merged.document_count += batch.properties.document_count;
        merged.total_occurrences += batch.properties.total_occurrences;
        merged.max_document_length = merged
            .max_document_length
            .max(batch.properties.max_document_length);
    }
    merged.average_document_length = if merged.document_count > 0 {
        merged.total_occurrences as f64 / merged.document_count as f64
    } else {
        0.0
    };
    merged
}
