//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use std::path::Path;

use blockdex::build::{slice_term_counts, slice_term_ids};
use blockdex::{
    Assembler, BuildConfig, FixedWidthTable, IndexDir, IntCodec, Merger, SortedVecLexicon, Vbyte,
};

/// Assemble `documents` (`title`, tokenized terms) into batches under
/// `root/batches` and merge them into `root/merged`, returning the opened
/// merged directory.
pub fn build_and_merge(
    root: &Path,
    documents: &[(&str, &[&str])],
    block_size: u32,
    batch_size: u32,
) -> IndexDir {
    let config = BuildConfig::new(block_size, batch_size).unwrap();
    let mut assembler = Assembler::new(root.join("batches"), config.clone()).unwrap();
    for &(title, terms) in documents {
        assembler.add_document(title, terms).unwrap();
    }
    let batches = assembler.finish().unwrap();

    let merged = root.join("merged");
    Merger::new(&batches, config).unwrap().merge(&merged).unwrap();
    IndexDir::open(&merged).unwrap()
}

/// Build a lexicon over a merged index's vocabulary.
pub fn lexicon(dir: &IndexDir) -> SortedVecLexicon {
    SortedVecLexicon::from_sorted(dir.read_lines("terms.txt").unwrap())
}

pub fn doc_lengths(dir: &IndexDir) -> FixedWidthTable<u32> {
    blockdex::build::read_u32_table(&dir.read_bytes("doc.sizes").unwrap()).unwrap()
}

pub fn doc_frequencies(dir: &IndexDir) -> Vec<u32> {
    let terms = dir.read_lines("terms.txt").unwrap();
    let bytes = dir.read_bytes("terms.docfreq").unwrap();
    let mut out = Vec::with_capacity(terms.len());
    Vbyte::delta_decode(&bytes, &mut out, terms.len(), 0).unwrap();
    out
}

/// Open term `index`'s raw `(document, tf)` posting-list view.
pub fn term_postings(
    dir: &IndexDir,
    doc_frequencies: &[u32],
    index: usize,
) -> blockdex::PostingListView<'static, blockdex::StreamVbyte> {
    let id_offsets =
        blockdex::build::read_u64_table(&dir.read_bytes("doc.idoff").unwrap()).unwrap();
    let count_offsets =
        blockdex::build::read_u64_table(&dir.read_bytes("doc.countoff").unwrap()).unwrap();
    let id_bytes = dir.read_bytes("doc.id").unwrap();
    let count_bytes = dir.read_bytes("doc.count").unwrap();

    let ids = slice_term_ids(&id_bytes, id_offsets.as_slice(), doc_frequencies, index).unwrap();
    let counts =
        slice_term_counts(&count_bytes, count_offsets.as_slice(), doc_frequencies, index).unwrap();
    blockdex::PostingListView::new(ids, counts).unwrap()
}
