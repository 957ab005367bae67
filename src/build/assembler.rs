// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Assembler: accumulates one batch of documents in
//! memory (`term -> sorted doc-id -> term frequency`), then flushes a
//! self-contained batch directory the merger later combines.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

use tracing::{info, instrument};

use crate::blocklist::{BlockListBuilder, DeltaBlockList, FlatBlockList};
use crate::build::offset_table::{write_u32_table, write_u64_table};
use crate::codec::{IntCodec, StreamVbyte, Vbyte};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::index_dir::IndexDir;
use crate::properties::CollectionProperties;

/// In-memory batch state: every term seen so far in this batch, mapped to
/// its postings as `local document id -> term frequency`, kept sorted by
/// document id via `BTreeMap`.
#[derive(Default)]
struct BatchState {
    titles: Vec<String>,
    document_lengths: Vec<u32>,
    postings: BTreeMap<String, BTreeMap<u32, u32>>,
    properties: Option<CollectionProperties>,
}

/// Accumulates documents into bounded-memory batches and writes each one to
/// its own directory under `output_root` once full.
pub struct Assembler {
    output_root: PathBuf,
    config: BuildConfig,
    batch_index: u32,
    state: BatchState,
    batch_paths: Vec<PathBuf>,
}

impl Assembler {
    pub fn new(output_root: impl Into<PathBuf>, config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let block_size = config.block_size;
        Ok(Assembler {
            output_root: output_root.into(),
            config,
            batch_index: 0,
            state: BatchState {
                properties: Some(CollectionProperties::new(block_size)),
                ..Default::default()
            },
            batch_paths: Vec::new(),
        })
    }

    /// Insert one document: its title and its tokenized term stream. Terms
    /// are counted into `tf` per document.
    pub fn add_document(&mut self, title: &str, terms: &[&str]) -> Result<()> {
        if self.state.titles.len() as u32 >= self.config.batch_size {
            self.flush_batch()?;
        }

        let doc_id = self.state.titles.len() as u32;
        self.state.titles.push(title.to_string());
        self.state.document_lengths.push(terms.len() as u32);

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for &term in terms {
            *counts.entry(term).or_insert(0) += 1;
        }
        for (term, tf) in counts {
            self.state
                .postings
                .entry(term.to_string())
                .or_default()
                .insert(doc_id, tf);
        }

        self.state
            .properties
            .as_mut()
            .unwrap()
            .record_document(terms.len() as u32);

        Ok(())
    }

    /// Flush the current batch (if non-empty) and return every batch
    /// directory written so far, in order.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        if !self.state.titles.is_empty() {
            self.flush_batch()?;
        }
        Ok(self.batch_paths)
    }

    #[instrument(skip(self), fields(batch = self.batch_index))]
    fn flush_batch(&mut self) -> Result<()> {
        let batch_path = self
            .output_root
            .join(format!("batch_{:04}", self.batch_index));
        let dir = IndexDir::create(&batch_path)?;

        let state = std::mem::replace(
            &mut self.state,
            BatchState {
                properties: Some(CollectionProperties::new(self.config.block_size)),
                ..Default::default()
            },
        );

        let mut term_names = Vec::with_capacity(state.postings.len());
        let mut doc_frequencies: Vec<u32> = Vec::with_capacity(state.postings.len());
        let mut term_occurrences: Vec<u32> = Vec::with_capacity(state.postings.len());
        let mut id_blocks = Vec::new();
        let mut count_blocks = Vec::new();
        let mut id_offsets = Vec::with_capacity(state.postings.len());
        let mut count_offsets = Vec::with_capacity(state.postings.len());

        // Terms are already lexicographically ordered by `BTreeMap` keys.
        for (term, docs) in &state.postings {
            term_names.push(term.clone());
            doc_frequencies.push(docs.len() as u32);
            term_occurrences.push(docs.values().sum());

            let mut doc_builder: BlockListBuilder<StreamVbyte, true> =
                BlockListBuilder::new(self.config.block_size);
            let mut count_builder: BlockListBuilder<StreamVbyte, false> =
                BlockListBuilder::new(self.config.block_size);
            for (&doc_id, &tf) in docs {
                doc_builder.add(doc_id);
                count_builder.add(tf);
            }

            id_offsets.push(id_blocks.len() as u64);
            id_blocks.extend_from_slice(&doc_builder.encode());
            count_offsets.push(count_blocks.len() as u64);
            count_blocks.extend_from_slice(&count_builder.encode());
        }

        dir.write_atomic("terms.txt", term_names.join("\n").as_bytes())?;
        dir.write_atomic("titles.txt", state.titles.join("\n").as_bytes())?;
        dir.write_atomic("doc.sizes", &write_u32_table(&state.document_lengths))?;

        let mut docfreq_bytes = Vec::new();
        Vbyte::delta_encode(&doc_frequencies, 0, &mut docfreq_bytes);
        dir.write_atomic("terms.docfreq", &docfreq_bytes)?;

        let mut term_occurrences_bytes = Vec::new();
        Vbyte::delta_encode(&term_occurrences, 0, &mut term_occurrences_bytes);
        dir.write_atomic("term.occurrences", &term_occurrences_bytes)?;

        dir.write_atomic("doc.id", &id_blocks)?;
        dir.write_atomic("doc.idoff", &write_u64_table(&id_offsets))?;
        dir.write_atomic("doc.count", &count_blocks)?;
        dir.write_atomic("doc.countoff", &write_u64_table(&count_offsets))?;

        let mut properties = state.properties.unwrap();
        // `document_count` must reflect every title, not just ones with
        // postings (an all-stopword document still occupies a doc id).
        properties.document_count = state.titles.len() as u32;
        dir.write_json("properties.json", &properties)?;

        info!(
            batch = self.batch_index,
            documents = properties.document_count,
            terms = term_names.len(),
            "flushed batch"
        );

        self.batch_paths.push(batch_path);
        self.batch_index += 1;
        Ok(())
    }
}

/// Carve out term `index`'s document-list block list (0-based, in the
/// lexicographic order the batch was written in) from an already-loaded
/// `doc.id` buffer. Used by the merger and the offline scoring pass, both
/// of which need random access across many terms and load the backing file
/// once rather than per term.
pub fn slice_term_ids<'a>(
    bytes: &[u8],
    offsets: &[u64],
    lengths: &[u32],
    index: usize,
) -> Result<DeltaBlockList<'a, StreamVbyte>> {
    let start = offsets[index] as usize;
    let end = offsets
        .get(index + 1)
        .map(|&o| o as usize)
        .unwrap_or(bytes.len());
    let memory = crate::memview::MemoryView::owned(bytes[start..end].to_vec());
    DeltaBlockList::from_memory(memory)?.with_length(lengths[index])
}

/// Same as [`slice_term_ids`], for a `doc.count` buffer.
pub fn slice_term_counts<'a>(
    bytes: &[u8],
    offsets: &[u64],
    lengths: &[u32],
    index: usize,
) -> Result<FlatBlockList<'a, StreamVbyte>> {
    let start = offsets[index] as usize;
    let end = offsets
        .get(index + 1)
        .map(|&o| o as usize)
        .unwrap_or(bytes.len());
    let memory = crate::memview::MemoryView::owned(bytes[start..end].to_vec());
    FlatBlockList::from_memory(memory)?.with_length(lengths[index])
}

/// Parse a stream of `title\tterm1 term2 ...` lines into a batched build.
pub fn ingest_lines<R: BufRead>(
    reader: R,
    output_root: impl Into<PathBuf>,
    config: BuildConfig,
) -> Result<Vec<PathBuf>> {
    let mut assembler = Assembler::new(output_root, config)?;
    for line in reader.lines() {
        let line = line.map_err(|e| crate::error::IndexError::io("<stream>", e))?;
        let Some((title, rest)) = line.split_once('\t') else {
            continue;
        };
        let terms: Vec<&str> = rest.split_whitespace().collect();
        assembler.add_document(title, &terms)?;
    }
    assembler.finish()
}
