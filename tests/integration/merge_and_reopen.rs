//! Exercises the multi-batch -> merge -> reopen path, plus the read-only,
//! multi-reader sharing the concurrency model promises for a built index.

use std::sync::Arc;
use std::thread;

use blockdex::{CollectionProperties, IndexDir, Lexicon};

use super::common;

const DOCS: &[(&str, &[&str])] = &[
    ("Doc1", &["a", "b", "a"]),
    ("Doc2", &["c", "b", "b"]),
    ("Doc3", &["z", "c", "a"]),
    ("Doc4", &["a", "z"]),
    ("Doc5", &["b", "c", "z"]),
    ("Doc6", &["a", "a", "z"]),
];

#[test]
fn small_batches_merge_to_the_same_vocabulary_as_one_big_batch() {
    let root = tempfile::tempdir().unwrap();

    let many_batches = common::build_and_merge(root.path().join("many").as_path(), DOCS, 1024, 1);
    let one_batch = common::build_and_merge(root.path().join("one").as_path(), DOCS, 1024, 64);

    let many_terms = many_batches.read_lines("terms.txt").unwrap();
    let one_terms = one_batch.read_lines("terms.txt").unwrap();
    assert_eq!(many_terms, one_terms);

    let many_props: CollectionProperties = many_batches.read_json("properties.json").unwrap();
    let one_props: CollectionProperties = one_batch.read_json("properties.json").unwrap();
    assert_eq!(many_props.document_count, one_props.document_count);
    assert_eq!(many_props.total_occurrences, one_props.total_occurrences);
    assert!((many_props.average_document_length - one_props.average_document_length).abs() < 1e-9);

    let many_ids = many_batches.read_bytes("doc.id").unwrap();
    let one_ids = one_batch.read_bytes("doc.id").unwrap();
    assert_eq!(many_ids, one_ids, "batching should not change final postings bytes");
}

#[test]
fn a_built_index_supports_concurrent_independent_readers() {
    let root = tempfile::tempdir().unwrap();
    let _ = common::build_and_merge(root.path(), DOCS, 1024, 2);
    let merged_path = Arc::new(root.path().join("merged"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let merged_path = Arc::clone(&merged_path);
            thread::spawn(move || {
                let reader = IndexDir::open(&*merged_path).unwrap();
                let lex = common::lexicon(&reader);
                lex.lookup("a").is_some()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
