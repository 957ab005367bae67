// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Offline scoring pass: reads a built (merged) index, computes a quantized
//! impact score for every posting under one named scorer, and writes the
//! result as a new blocked list sharing the document list's skip structure,
//! plus per-term `max`/`mean`/`variance` statistics over the quantized
//! scores.
//!
//! Two passes over the vocabulary, matching the two-phase discipline the
//! parallel reduction needs: the first computes the global `(min, max)`
//! score range (clamped to include zero) so a single `LinearQuantizer` can
//! be shared by every term; the second quantizes each term's postings and
//! accumulates its statistics. Both passes run per-term in parallel when the
//! `parallel` feature is enabled (`rayon`), falling back to a sequential
//! scan otherwise -- the final write is always in term-id order regardless
//! of which worker finished first, since each phase returns a plain `Vec`
//! indexed by term position before anything touches disk.

use crate::blocklist::BlockListBuilder;
use crate::build::{
    read_f64_table, read_u32_table, read_u64_table, slice_term_counts, slice_term_ids,
    write_f64_table, write_u64_table,
};
use crate::codec::{IntCodec, StreamVbyte, Vbyte};
use crate::config::ScoreConfig;
use crate::error::Result;
use crate::index_dir::IndexDir;
use crate::posting::PostingListView;
use crate::properties::{CollectionProperties, ScoreDescriptor};
use crate::scoring::{CollectionStats, LinearQuantizer, TermStats};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-term inputs the scoring pass needs beyond the raw postings: its
/// document frequency, its collection frequency (total occurrences), and
/// its postings as `(document, tf)` pairs.
struct TermInput {
    document_frequency: u32,
    collection_frequency: u32,
    postings: Vec<(u32, u32)>,
}

struct ScorePassState {
    terms: Vec<TermInput>,
    collection: CollectionStats,
    document_lengths: Vec<u32>,
}

impl ScorePassState {
    fn load(dir: &IndexDir) -> Result<Self> {
        let terms = dir.read_lines("terms.txt")?;
        let vocab_size = terms.len();

        let docfreq_bytes = dir.read_bytes("terms.docfreq")?;
        let mut document_frequencies = Vec::with_capacity(vocab_size);
        Vbyte::delta_decode(&docfreq_bytes, &mut document_frequencies, vocab_size, 0)?;

        let occurrences_bytes = dir.read_bytes("term.occurrences")?;
        let mut collection_frequencies = Vec::with_capacity(vocab_size);
        Vbyte::delta_decode(&occurrences_bytes, &mut collection_frequencies, vocab_size, 0)?;

        let id_bytes = dir.read_bytes("doc.id")?;
        let count_bytes = dir.read_bytes("doc.count")?;
        let id_offsets = read_u64_table(&dir.read_bytes("doc.idoff")?)?
            .as_slice()
            .to_vec();
        let count_offsets = read_u64_table(&dir.read_bytes("doc.countoff")?)?
            .as_slice()
            .to_vec();

        let document_lengths = read_u32_table(&dir.read_bytes("doc.sizes")?)?
            .as_slice()
            .to_vec();
        let properties: CollectionProperties = dir.read_json("properties.json")?;

        let mut term_inputs = Vec::with_capacity(vocab_size);
        for i in 0..vocab_size {
            let ids = slice_term_ids(&id_bytes, &id_offsets, &document_frequencies, i)?;
            let counts = slice_term_counts(&count_bytes, &count_offsets, &document_frequencies, i)?;
            let postings: Vec<(u32, u32)> = PostingListView::new(ids, counts)?
                .cursor()
                .map(|p| p.map(Into::into))
                .collect::<Result<_>>()?;
            term_inputs.push(TermInput {
                document_frequency: document_frequencies[i],
                collection_frequency: collection_frequencies[i],
                postings,
            });
        }

        Ok(ScorePassState {
            terms: term_inputs,
            collection: CollectionStats {
                document_count: properties.document_count as u64,
                average_document_length: properties.average_document_length,
                total_occurrences: properties.total_occurrences,
            },
            document_lengths,
        })
    }

    fn term_real_scores(&self, index: usize, config: &ScoreConfig) -> Vec<f64> {
        let term = &self.terms[index];
        let stats = TermStats {
            document_frequency: term.document_frequency as u64,
            collection_frequency: term.collection_frequency as u64,
        };
        term.postings
            .iter()
            .map(|&(doc, tf)| {
                let dl = self
                    .document_lengths
                    .get(doc as usize)
                    .copied()
                    .unwrap_or(0) as f64;
                config.scorer.score(tf as f64, dl, stats, self.collection)
            })
            .collect()
    }
}

/// Per-term quantized output: the postings' quantized scores plus the
/// statistics companion tables.
struct TermOutput {
    quantized: Vec<u32>,
    max: f64,
    mean: f64,
    variance: f64,
}

fn reduce_min_max(state: &ScorePassState, config: &ScoreConfig) -> (f64, f64) {
    let per_term_range = |i: usize| -> Option<(f64, f64)> {
        let scores = state.term_real_scores(i, config);
        scores.iter().copied().fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
    };

    #[cfg(feature = "parallel")]
    let combined = (0..state.terms.len())
        .into_par_iter()
        .filter_map(per_term_range)
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)),
        );

    #[cfg(not(feature = "parallel"))]
    let combined = (0..state.terms.len()).filter_map(per_term_range).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)),
    );

    let (min, max) = combined;
    if !min.is_finite() || !max.is_finite() {
        // No postings at all anywhere in the index; any non-empty domain works.
        return (0.0, 1.0);
    }
    // Clamped so the quantizer's domain always straddles zero, per the
    // offline pass's requirement that its integer lower bound maps to zero.
    (min.min(0.0), max.max(0.0).max(min.min(0.0) + f64::EPSILON))
}

fn quantize_term(state: &ScorePassState, index: usize, config: &ScoreConfig, q: &LinearQuantizer) -> TermOutput {
    let scores = state.term_real_scores(index, config);
    let quantized: Vec<u32> = scores.iter().map(|&s| q.quantize(s)).collect();

    let n = quantized.len() as f64;
    let (max, mean) = if quantized.is_empty() {
        (0.0, 0.0)
    } else {
        let max = quantized.iter().copied().max().unwrap() as f64;
        let mean = quantized.iter().map(|&v| v as f64).sum::<f64>() / n;
        (max, mean)
    };
    let variance = if quantized.is_empty() {
        0.0
    } else {
        quantized
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n
    };

    TermOutput {
        quantized,
        max,
        mean,
        variance,
    }
}

/// Run the offline scoring pass over `dir`, producing `<name>.scores` /
/// `<name>.offsets` (where `<name>` is [`ScoreConfig::stem`]) plus
/// `.maxscore` / `.expscore` / `.varscore`, and recording the quantization
/// domain in `properties.json`.
pub fn run_score_pass(dir: &IndexDir, config: &ScoreConfig) -> Result<()> {
    // Unquantized (bits == 0) configs name an on-the-fly scorer; there is no
    // integer domain to write a `.scores` stream into.
    if config.bits == 0 {
        return Err(crate::error::IndexError::QuantizationDomain(
            "offline scoring pass requires bits > 0 to produce an on-disk score stream".into(),
        ));
    }

    let state = ScorePassState::load(dir)?;
    let properties: CollectionProperties = dir.read_json("properties.json")?;
    let block_size = properties.skip_block_size.max(1);

    let (real_min, real_max) = reduce_min_max(&state, config);
    let quantizer = LinearQuantizer::new_for_offline_pass(real_min, real_max, config.bits)?;

    #[cfg(feature = "parallel")]
    let outputs: Vec<TermOutput> = (0..state.terms.len())
        .into_par_iter()
        .map(|i| quantize_term(&state, i, config, &quantizer))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let outputs: Vec<TermOutput> = (0..state.terms.len())
        .map(|i| quantize_term(&state, i, config, &quantizer))
        .collect();

    let mut score_blocks = Vec::new();
    let mut score_offsets = Vec::with_capacity(outputs.len());
    let mut maxscore = Vec::with_capacity(outputs.len());
    let mut meanscore = Vec::with_capacity(outputs.len());
    let mut varscore = Vec::with_capacity(outputs.len());

    for out in &outputs {
        let mut builder: BlockListBuilder<StreamVbyte, false> = BlockListBuilder::new(block_size);
        for &v in &out.quantized {
            builder.add(v);
        }
        score_offsets.push(score_blocks.len() as u64);
        score_blocks.extend_from_slice(&builder.encode());
        maxscore.push(out.max);
        meanscore.push(out.mean);
        varscore.push(out.variance);
    }

    let stem = config.stem();
    dir.write_atomic(&format!("{stem}.scores"), &score_blocks)?;
    dir.write_atomic(&format!("{stem}.offsets"), &write_u64_table(&score_offsets))?;
    dir.write_atomic(&format!("{stem}.maxscore"), &write_f64_table(&maxscore))?;
    dir.write_atomic(&format!("{stem}.expscore"), &write_f64_table(&meanscore))?;
    dir.write_atomic(&format!("{stem}.varscore"), &write_f64_table(&varscore))?;

    let mut properties = properties;
    properties.scorers.insert(
        stem,
        ScoreDescriptor {
            kind: config.scorer.name().to_string(),
            bits: config.bits,
            real_min,
            real_max,
        },
    );
    dir.write_json("properties.json", &properties)?;

    Ok(())
}

/// Load the per-term statistics written alongside `<name>.scores`.
pub fn read_score_stats(dir: &IndexDir, stem: &str) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let max = read_f64_table(&dir.read_bytes(&format!("{stem}.maxscore"))?)?
        .as_slice()
        .to_vec();
    let mean = read_f64_table(&dir.read_bytes(&format!("{stem}.expscore"))?)?
        .as_slice()
        .to_vec();
    let variance = read_f64_table(&dir.read_bytes(&format!("{stem}.varscore"))?)?
        .as_slice()
        .to_vec();
    Ok((max, mean, variance))
}
