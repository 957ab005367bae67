//! Build a small corpus, merge it, then run a multi-term query against the
//! resulting index with on-the-fly BM25 scoring -- end to end through the
//! public API, no crate-internal shortcuts.

use blockdex::traversal::{daat, taat, IndexTermCursor, PayloadMode, TermCursor};
use blockdex::{
    Bm25Params, CollectionProperties, CollectionStats, FixedWidthTable, Lexicon, PostingListView,
    ScorerKind, StreamVbyte, TermStats,
};

use super::common;

const DOCS: &[(&str, &[&str])] = &[
    ("Doc1", &["rust", "search", "rust", "index"]),
    ("Doc2", &["search", "engine", "rust"]),
    ("Doc3", &["index", "merge", "engine"]),
    ("Doc4", &["rust", "rust", "rust", "engine", "search"]),
    ("Doc5", &["merge", "skip", "list"]),
];

fn collection_stats(properties: &CollectionProperties) -> CollectionStats {
    CollectionStats {
        document_count: properties.document_count as u64,
        average_document_length: properties.average_document_length,
        total_occurrences: properties.total_occurrences,
    }
}

/// Build a query cursor for each matched term, all borrowing from `views`
/// and `doc_lengths`, which must outlive the returned vector.
fn build_cursors<'a>(
    views: &'a [PostingListView<'static, StreamVbyte>],
    stats: &'a [TermStats],
    scorer: ScorerKind,
    collection: CollectionStats,
    doc_lengths: &'a FixedWidthTable<u32>,
) -> Vec<Box<dyn TermCursor + 'a>> {
    views
        .iter()
        .zip(stats.iter())
        .map(|(view, &term)| {
            let mode = PayloadMode::OnTheFly {
                scorer,
                term,
                collection,
                doc_lengths,
            };
            Box::new(IndexTermCursor::new(view.cursor(), mode)) as Box<dyn TermCursor + 'a>
        })
        .collect()
}

#[test]
fn taat_and_daat_agree_over_a_real_index() {
    let root = tempfile::tempdir().unwrap();
    let dir = common::build_and_merge(root.path(), DOCS, 1024, 2);

    let lex = common::lexicon(&dir);
    let doc_lengths = common::doc_lengths(&dir);
    let doc_frequencies = common::doc_frequencies(&dir);
    let properties: CollectionProperties = dir.read_json("properties.json").unwrap();
    let collection = collection_stats(&properties);

    let terms = dir.read_lines("terms.txt").unwrap();
    let mut collection_frequencies = Vec::with_capacity(terms.len());
    blockdex::Vbyte::delta_decode(
        &dir.read_bytes("term.occurrences").unwrap(),
        &mut collection_frequencies,
        terms.len(),
        0,
    )
    .unwrap();

    let query = ["rust", "search", "engine"];
    let matched_ids: Vec<usize> = query
        .iter()
        .filter_map(|&word| lex.lookup(word))
        .map(|id| id as usize)
        .collect();
    assert_eq!(matched_ids.len(), query.len(), "every query term is in the corpus");

    let views: Vec<PostingListView<'static, StreamVbyte>> = matched_ids
        .iter()
        .map(|&id| common::term_postings(&dir, &doc_frequencies, id))
        .collect();
    let stats: Vec<TermStats> = matched_ids
        .iter()
        .map(|&id| TermStats {
            document_frequency: doc_frequencies[id] as u64,
            collection_frequency: collection_frequencies[id] as u64,
        })
        .collect();

    let scorer = ScorerKind::Bm25(Bm25Params::default());
    let n_docs = properties.document_count as usize;

    let mut taat_terms = build_cursors(&views, &stats, scorer, collection, &doc_lengths);
    let taat_result = taat(&mut taat_terms, n_docs, 5).unwrap();

    let mut daat_terms = build_cursors(&views, &stats, scorer, collection, &doc_lengths);
    let daat_result = daat(&mut daat_terms, 5).unwrap();

    assert_eq!(taat_result, daat_result);
    assert!(!taat_result.is_empty());
    // Doc5 ("merge skip list") shares none of the query terms and must be
    // absent; every other document matches at least one term.
    assert!(taat_result.iter().all(|&(doc, _)| doc != 4));
    assert_eq!(taat_result.len(), 4);
}

#[test]
fn a_query_with_no_matching_terms_returns_nothing() {
    let root = tempfile::tempdir().unwrap();
    let dir = common::build_and_merge(root.path(), DOCS, 1024, 2);
    let lex = common::lexicon(&dir);

    assert_eq!(lex.lookup("nonexistent"), None);
    let mut terms: Vec<Box<dyn TermCursor>> = Vec::new();
    assert!(taat(&mut terms, 5, 5).unwrap().is_empty());
}
