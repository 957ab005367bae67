// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Offline build pipeline: the assembler (the batch builder) and the helpers
//! it shares with the merger for reading/writing a batch directory.

mod assembler;
mod offset_table;

pub use assembler::{ingest_lines, slice_term_counts, slice_term_ids, Assembler};
pub use offset_table::{
    read_f64_table, read_u32_table, read_u64_table, write_f64_table, write_u32_table,
    write_u64_table,
};
