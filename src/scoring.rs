// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scoring & quantization: BM25 and query-likelihood
//! scorers, a raw-count scorer, and the linear quantizer that maps a
//! real-valued score range onto a fixed-width integer range for compact
//! on-disk storage.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// BM25 parameters. The offline scorer and the on-the-fly scorer share one
/// definition (`k1 = 1.2, b = 0.5`); earlier drafts of this engine split `b`
/// between the two call sites, but that split is not reproduced here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.2, b: 0.5 }
    }
}

/// `score = idf * (k1+1) * tf / (tf + k1*(1 - b + b*dl/avgdl))`,
/// `idf = ln((n - df + 0.5)/(df + 0.5))`.
pub fn bm25(tf: f64, dl: f64, df: u64, n: u64, avgdl: f64, params: Bm25Params) -> f64 {
    let idf = (((n as f64) - (df as f64) + 0.5) / ((df as f64) + 0.5)).ln();
    let norm = params.k1 * (1.0 - params.b + params.b * dl / avgdl);
    idf * (params.k1 + 1.0) * tf / (tf + norm)
}

/// Dirichlet query-likelihood parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QlParams {
    pub mu: f64,
}

impl Default for QlParams {
    fn default() -> Self {
        QlParams { mu: 2500.0 }
    }
}

/// `score = log((tf + mu*(cf/total_occurrences)) / (dl + mu))`.
pub fn query_likelihood(
    tf: f64,
    dl: f64,
    cf: u64,
    total_occurrences: u64,
    params: QlParams,
) -> f64 {
    let background = params.mu * (cf as f64) / (total_occurrences as f64);
    ((tf + background) / (dl + params.mu)).ln()
}

/// A scorer selectable at query time, parameterized by scoring kind. Plain
/// structs holding parameters, not a trait implemented across the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScorerKind {
    Bm25(Bm25Params),
    QueryLikelihood(QlParams),
    Count,
}

/// Per-term statistics needed to score on the fly: document frequency and
/// collection frequency (total occurrences of the term across all documents).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TermStats {
    pub document_frequency: u64,
    pub collection_frequency: u64,
}

/// Collection-wide constants a scorer needs that don't vary per term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionStats {
    pub document_count: u64,
    pub average_document_length: f64,
    pub total_occurrences: u64,
}

impl ScorerKind {
    pub fn score(
        self,
        tf: f64,
        document_length: f64,
        term: TermStats,
        collection: CollectionStats,
    ) -> f64 {
        match self {
            ScorerKind::Bm25(params) => bm25(
                tf,
                document_length,
                term.document_frequency,
                collection.document_count,
                collection.average_document_length,
                params,
            ),
            ScorerKind::QueryLikelihood(params) => query_likelihood(
                tf,
                document_length,
                term.collection_frequency,
                collection.total_occurrences,
                params,
            ),
            ScorerKind::Count => tf,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScorerKind::Bm25(_) => "bm25",
            ScorerKind::QueryLikelihood(_) => "ql",
            ScorerKind::Count => "count",
        }
    }
}

/// Maps `x in [real_min, real_max]` onto `[int_min, int_max]` linearly:
/// `floor((x - real_min) * (int_max - int_min) / (real_max - real_min)) + int_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearQuantizer {
    real_min: f64,
    real_max: f64,
    int_min: u32,
    int_max: u32,
}

impl LinearQuantizer {
    pub fn new(real_min: f64, real_max: f64, int_min: u32, int_max: u32) -> Result<Self> {
        if !(real_max > real_min) {
            return Err(IndexError::QuantizationDomain(format!(
                "real range [{real_min}, {real_max}] is empty"
            )));
        }
        if int_max <= int_min {
            return Err(IndexError::QuantizationDomain(format!(
                "integer range [{int_min}, {int_max}] is empty"
            )));
        }
        Ok(LinearQuantizer {
            real_min,
            real_max,
            int_min,
            int_max,
        })
    }

    /// As required for the offline scoring pass: the
    /// integer lower bound must be zero.
    pub fn new_for_offline_pass(real_min: f64, real_max: f64, bits: u8) -> Result<Self> {
        if bits == 0 || bits > 32 {
            return Err(IndexError::QuantizationDomain(format!(
                "bits must be in 1..=32, got {bits}"
            )));
        }
        let int_max = if bits == 32 {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        Self::new(real_min, real_max, 0, int_max)
    }

    pub fn int_min(&self) -> u32 {
        self.int_min
    }

    pub fn int_max(&self) -> u32 {
        self.int_max
    }

    /// Quantize `x`, saturating at the declared integer bounds. This is the
    /// variant exercised by tests; the
    /// offline pass uses it unconditionally since its bounds are computed
    /// from the actual score range and can't be exceeded except by float
    /// rounding at the very edges.
    pub fn quantize(&self, x: f64) -> u32 {
        if x <= self.real_min {
            return self.int_min;
        }
        if x >= self.real_max {
            return self.int_max;
        }
        let scale = (self.int_max - self.int_min) as f64 / (self.real_max - self.real_min);
        let raw = ((x - self.real_min) * scale).floor() + self.int_min as f64;
        raw.clamp(self.int_min as f64, self.int_max as f64) as u32
    }
}
