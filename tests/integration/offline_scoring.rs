//! Run the offline scoring pass over a merged index and query the
//! resulting prescored postings directly, without recomputing any score.

use blockdex::build::{slice_term_counts, slice_term_ids};
use blockdex::score_pass::run_score_pass;
use blockdex::traversal::{daat, taat, IndexTermCursor, PayloadMode, TermCursor};
use blockdex::{Bm25Params, CollectionProperties, Lexicon, PostingListView, ScoreConfig, ScorerKind};

use super::common;

/// One `IndexTermCursor` per view, reading payloads as already-scored.
fn prescored_cursors<'a>(
    views: &'a [PostingListView<'static, blockdex::StreamVbyte>],
) -> Vec<Box<dyn TermCursor + 'a>> {
    views
        .iter()
        .map(|v| Box::new(IndexTermCursor::new(v.cursor(), PayloadMode::Prescored)) as Box<dyn TermCursor + 'a>)
        .collect()
}

const DOCS: &[(&str, &[&str])] = &[
    ("Doc1", &["alpha", "beta", "alpha"]),
    ("Doc2", &["beta", "gamma"]),
    ("Doc3", &["alpha", "gamma", "gamma"]),
    ("Doc4", &["delta"]),
];

#[test]
fn prescored_postings_round_trip_through_the_declared_bit_range() {
    let root = tempfile::tempdir().unwrap();
    let dir = common::build_and_merge(root.path(), DOCS, 4, 2);

    let config = ScoreConfig::new("bm25", ScorerKind::Bm25(Bm25Params::default()), 6).unwrap();
    run_score_pass(&dir, &config).unwrap();

    let properties: CollectionProperties = dir.read_json("properties.json").unwrap();
    let descriptor = properties.scorers.get("bm25-6").expect("scorer recorded");
    assert_eq!(descriptor.bits, 6);
    assert_eq!(descriptor.kind, "bm25");

    let lex = common::lexicon(&dir);
    let doc_frequencies = common::doc_frequencies(&dir);
    let alpha = lex.lookup("alpha").unwrap() as usize;

    let id_offsets = blockdex::build::read_u64_table(&dir.read_bytes("doc.idoff").unwrap()).unwrap();
    let score_offsets =
        blockdex::build::read_u64_table(&dir.read_bytes("bm25-6.offsets").unwrap()).unwrap();
    let id_bytes = dir.read_bytes("doc.id").unwrap();
    let score_bytes = dir.read_bytes("bm25-6.scores").unwrap();

    let ids = slice_term_ids(&id_bytes, id_offsets.as_slice(), &doc_frequencies, alpha).unwrap();
    let scores =
        slice_term_counts(&score_bytes, score_offsets.as_slice(), &doc_frequencies, alpha).unwrap();
    let view = PostingListView::new(ids, scores).unwrap();

    for posting in view.cursor() {
        let posting = posting.unwrap();
        assert!(posting.payload() <= 63, "payload must fit in 6 bits");
    }
}

#[test]
fn taat_and_daat_agree_when_reading_prescored_payloads() {
    let root = tempfile::tempdir().unwrap();
    let dir = common::build_and_merge(root.path(), DOCS, 4, 2);

    let config = ScoreConfig::new("bm25", ScorerKind::Bm25(Bm25Params::default()), 8).unwrap();
    run_score_pass(&dir, &config).unwrap();

    let lex = common::lexicon(&dir);
    let doc_frequencies = common::doc_frequencies(&dir);
    let query = ["alpha", "beta", "gamma"];
    let matched_ids: Vec<usize> = query
        .iter()
        .filter_map(|&w| lex.lookup(w))
        .map(|id| id as usize)
        .collect();
    assert_eq!(matched_ids.len(), query.len());

    let id_offsets = blockdex::build::read_u64_table(&dir.read_bytes("doc.idoff").unwrap()).unwrap();
    let score_offsets =
        blockdex::build::read_u64_table(&dir.read_bytes("bm25-8.offsets").unwrap()).unwrap();
    let id_bytes = dir.read_bytes("doc.id").unwrap();
    let score_bytes = dir.read_bytes("bm25-8.scores").unwrap();

    let views: Vec<PostingListView<'static, blockdex::StreamVbyte>> = matched_ids
        .iter()
        .map(|&id| {
            let ids =
                slice_term_ids(&id_bytes, id_offsets.as_slice(), &doc_frequencies, id).unwrap();
            let scores = slice_term_counts(
                &score_bytes,
                score_offsets.as_slice(),
                &doc_frequencies,
                id,
            )
            .unwrap();
            PostingListView::new(ids, scores).unwrap()
        })
        .collect();

    let n_docs = DOCS.len();
    let mut taat_terms = prescored_cursors(&views);
    let taat_result = taat(&mut taat_terms, n_docs, 4).unwrap();
    let mut daat_terms = prescored_cursors(&views);
    let daat_result = daat(&mut daat_terms, 4).unwrap();

    assert_eq!(taat_result, daat_result);
    // Doc4 ("delta") never matches the query and must be absent.
    assert!(taat_result.iter().all(|&(doc, _)| doc != 3));
}
