// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured error taxonomy for the index core.
//!
//! Every fallible entry point in this crate returns `Result<T, IndexError>`.
//! The variants mirror the five failure classes a reader or writer can hit:
//! a corrupt byte stream, an id outside its declared range, a file missing
//! from the index directory, a quantizer built with an invalid domain, or
//! plain filesystem failure. Nothing here retries or degrades on its own --
//! callers decide what a fatal decode error means for them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the codec, block-list, build, merge, and scoring paths.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A byte stream ended mid-value, or a block list's self-reported size
    /// doesn't match the memory window backing it, or an upper-bound table
    /// isn't monotonic.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A term id or document id fell outside `[0, count)`.
    #[error("out of range: {what} = {value}, valid range is [0, {bound})")]
    OutOfRange {
        what: &'static str,
        value: u64,
        bound: u64,
    },

    /// A required file was not present in the index directory.
    #[error("missing artifact: {0}")]
    MissingArtifact(PathBuf),

    /// The scoring pass was asked to quantize onto a domain that isn't
    /// representable: an empty real range, or an integral lower bound that
    /// isn't zero.
    #[error("quantization domain error: {0}")]
    QuantizationDomain(String),

    /// Underlying filesystem or mmap failure.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IndexError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        IndexError::MalformedInput(msg.into())
    }

    pub fn out_of_range(what: &'static str, value: u64, bound: u64) -> Self {
        IndexError::OutOfRange { what, value, bound }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
