// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Build/score configuration surface. These are plain,
//! `serde`-derived parameter objects validated at construction -- not a CLI,
//! not a config-file reader (that glue is a Non-goal per §1), just the
//! objects a host application constructs and passes into the assembler,
//! merger, and offline scoring pass.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::scoring::ScorerKind;

/// Parameters for the assembler and merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// `B`: postings per block, shared by every list in the index.
    pub block_size: u32,
    /// `M`: documents accumulated in memory before a batch is flushed.
    pub batch_size: u32,
    /// Drop terms with `df == 1` contributed by a single batch. Off by
    /// default.
    #[serde(default)]
    pub skip_unique_singletons: bool,
}

impl BuildConfig {
    pub fn new(block_size: u32, batch_size: u32) -> Result<Self> {
        let cfg = BuildConfig {
            block_size,
            batch_size,
            skip_unique_singletons: false,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(IndexError::malformed("block_size must be positive"));
        }
        if self.batch_size == 0 {
            return Err(IndexError::malformed("batch_size must be positive"));
        }
        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            block_size: 1024,
            batch_size: 100_000,
            skip_unique_singletons: false,
        }
    }
}

/// One named score stream to produce in the offline scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    pub name: String,
    pub scorer: ScorerKind,
    /// `0` means store the real-valued score unquantized.
    pub bits: u8,
}

impl ScoreConfig {
    pub fn new(name: impl Into<String>, scorer: ScorerKind, bits: u8) -> Result<Self> {
        let cfg = ScoreConfig {
            name: name.into(),
            scorer,
            bits,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bits > 32 {
            return Err(IndexError::QuantizationDomain(format!(
                "bits must be in 0..=32, got {}",
                self.bits
            )));
        }
        Ok(())
    }

    /// The on-disk `<name>` stem: `"<scorer>"` unquantized, `"<scorer>-<bits>"`
    /// quantized.
    pub fn stem(&self) -> String {
        if self.bits == 0 {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, self.bits)
        }
    }
}
