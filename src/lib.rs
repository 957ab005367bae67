// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Block-compressed inverted index core.
//!
//! This crate is the hard engineering at the center of an on-disk search
//! engine: a skip-listed, delta-coded posting-list format and the codecs
//! underneath it, the offline pipeline that builds and merges that format
//! from a tokenized document stream, and the query-time traversal
//! (term-at-a-time and document-at-a-time) that scores and ranks against it.
//!
//! # Layout
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌──────────────┐
//! │  codec.rs │──▶│ blocklist  │──▶│ block_iter   │
//! │ (vbyte,   │   │ (per-term  │   │ (advance_to, │
//! │  svb)     │   │  skip list)│   │  next_ge)    │
//! └───────────┘   └────────────┘   └──────┬───────┘
//!                                          │
//!        ┌─────────────────────────────────┘
//!        ▼
//! ┌────────────┐   ┌───────────┐   ┌────────────┐
//! │ posting.rs │──▶│ traversal │──▶│  topk.rs   │
//! │ (document, │   │ (TAAT,    │   │ (bounded   │
//! │  payload)  │   │  DAAT)    │   │  heap)     │
//! └────────────┘   └───────────┘   └────────────┘
//! ```
//!
//! Offline, `build::Assembler` turns a document stream into batch
//! directories; `merge::Merger` k-way merges those batches (rebasing
//! document ids by a running shift) into one index directory; `score_pass`
//! walks a built index to emit quantized, pre-scored companion posting
//! lists. `index_dir` and `properties` describe the on-disk directory
//! those stages read and write, per the file layout in `SPEC_FULL.md` §6.1.
//!
//! What this crate does **not** do: resolve query term strings to term ids
//! (see the [`lexicon`] module for the interface it consumes), parse a query
//! language, coordinate a query across shards, or tokenize/stem text. Those
//! are the caller's job.

pub mod block_iter;
pub mod blocklist;
pub mod build;
pub mod codec;
pub mod config;
pub mod error;
pub mod index_dir;
pub mod lexicon;
pub mod memview;
pub mod merge;
pub mod posting;
pub mod properties;
pub mod score_pass;
pub mod scoring;
pub mod table;
pub mod topk;
pub mod traversal;

pub use block_iter::BlockCursor;
pub use blocklist::{BlockList, BlockListBuilder, DeltaBlockList, FlatBlockList};
pub use build::Assembler;
pub use codec::{IntCodec, StreamVbyte, Vbyte};
pub use config::{BuildConfig, ScoreConfig};
pub use error::{IndexError, Result};
pub use index_dir::IndexDir;
pub use lexicon::{Id as TermId, Lexicon, SortedVecLexicon};
pub use memview::MemoryView;
pub use merge::Merger;
pub use posting::{Posting, PostingCursor, PostingListView};
pub use properties::{CollectionProperties, ScoreDescriptor};
pub use scoring::{Bm25Params, CollectionStats, LinearQuantizer, QlParams, ScorerKind, TermStats};
pub use table::FixedWidthTable;
pub use topk::TopK;
pub use traversal::{daat, taat, IndexTermCursor, PayloadMode, TermCursor, VecTermCursor};
