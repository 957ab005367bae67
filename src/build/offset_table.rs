// Copyright 2025-present Blockdex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Raw fixed-width offset tables (`doc.idoff`, `doc.countoff`,
//! `<name>.offsets`): a flat array of little-endian `u64` byte offsets, one
//! per term, into the companion concatenated block-list file. This is the
//! minimal admissible shape for the "compact/offset tables" interface in §6.2.

use crate::error::{IndexError, Result};
use crate::table::FixedWidthTable;

pub fn write_u64_table(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn read_u64_table(bytes: &[u8]) -> Result<FixedWidthTable<u64>> {
    if bytes.len() % 8 != 0 {
        return Err(IndexError::malformed(
            "offset table length is not a multiple of 8 bytes",
        ));
    }
    let values = bytes
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Ok(FixedWidthTable::new(values))
}

/// Same shape as [`write_u64_table`]/[`read_u64_table`] but four bytes wide
/// -- used for `doc.sizes`, where a `u64` per document would be wasteful.
pub fn write_u32_table(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn read_u32_table(bytes: &[u8]) -> Result<FixedWidthTable<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(IndexError::malformed(
            "fixed-width table length is not a multiple of 4 bytes",
        ));
    }
    let values = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Ok(FixedWidthTable::new(values))
}

/// Same shape again, eight bytes wide holding an IEEE-754 `f64` -- used for
/// the per-term score statistics (`<name>.maxscore`, `.expscore`, `.varscore`).
pub fn write_f64_table(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn read_f64_table(bytes: &[u8]) -> Result<FixedWidthTable<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(IndexError::malformed(
            "f64 table length is not a multiple of 8 bytes",
        ));
    }
    let values = bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Ok(FixedWidthTable::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_offsets() {
        let offsets = vec![0u64, 128, 512, 1024];
        let bytes = write_u64_table(&offsets);
        let table = read_u64_table(&bytes).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table[2], 512);
    }

    #[test]
    fn truncated_table_is_malformed() {
        assert!(read_u64_table(&[0u8, 1, 2]).is_err());
    }

    #[test]
    fn roundtrips_u32_sizes() {
        let sizes = vec![3u32, 0, 12];
        let bytes = write_u32_table(&sizes);
        let table = read_u32_table(&bytes).unwrap();
        assert_eq!(table.as_slice(), &sizes[..]);
    }

    #[test]
    fn roundtrips_f64_stats() {
        let stats = vec![0.0f64, 12.5, -3.25];
        let bytes = write_f64_table(&stats);
        let table = read_f64_table(&bytes).unwrap();
        assert_eq!(table.as_slice(), &stats[..]);
    }
}
