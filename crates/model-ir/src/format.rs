// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Binary layout of a model blob.
//!
//! All integers are little-endian.
//!
//! ```text
//! offset  size  field
//! 0       4     magic  = b"MIRT"
//! 4       4     schema_version
//! 8       4     num_tensors
//! 12      4     num_operators
//! 16      4     num_inputs
//! 20      4     num_outputs
//! 24      4     num_buffers
//! 28      4     data_len
//! 32      ...   tensor records    num_tensors   × 24 bytes
//!               operator records  num_operators × 28 bytes
//!               input indices     num_inputs    × 4 bytes
//!               output indices    num_outputs   × 4 bytes
//!               buffer records    num_buffers   × 8 bytes
//!               data section      data_len bytes
//! ```

use crate::ModelError;

/// Leading magic of every model blob.
pub const MAGIC: [u8; 4] = *b"MIRT";

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 3;

pub const HEADER_LEN: usize = 32;
pub const TENSOR_RECORD_LEN: usize = 24;
pub const OPERATOR_RECORD_LEN: usize = 28;
pub const INDEX_LEN: usize = 4;
pub const BUFFER_RECORD_LEN: usize = 8;

/// Sentinel buffer index for tensors without constant data.
pub const NO_BUFFER: u32 = u32::MAX;

/// Most inputs an operator record can hold.
pub const MAX_OPERATOR_INPUTS: usize = 3;
/// Most outputs an operator record can hold.
pub const MAX_OPERATOR_OUTPUTS: usize = 2;

/// Decoded fixed-size blob header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ModelHeader {
    pub schema_version: u32,
    pub num_tensors: u32,
    pub num_operators: u32,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub num_buffers: u32,
    pub data_len: u32,
}

impl ModelHeader {
    /// Parses the header, checking magic and length.
    pub fn parse(bytes: &[u8]) -> Result<Self, ModelError> {
        let header = bytes.get(..HEADER_LEN).ok_or(ModelError::Truncated {
            section: "header",
            needed: HEADER_LEN,
            available: bytes.len(),
        })?;

        let found = [header[0], header[1], header[2], header[3]];
        if found != MAGIC {
            return Err(ModelError::InvalidMagic { found });
        }

        Ok(Self {
            schema_version: le_u32(header, 4),
            num_tensors: le_u32(header, 8),
            num_operators: le_u32(header, 12),
            num_inputs: le_u32(header, 16),
            num_outputs: le_u32(header, 20),
            num_buffers: le_u32(header, 24),
            data_len: le_u32(header, 28),
        })
    }

    /// Serializes the header (including magic).
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&MAGIC);
        let fields = [
            self.schema_version,
            self.num_tensors,
            self.num_operators,
            self.num_inputs,
            self.num_outputs,
            self.num_buffers,
            self.data_len,
        ];
        for (i, value) in fields.iter().enumerate() {
            let at = 4 + i * 4;
            out[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}

/// Byte offsets of each section, computed from a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SectionLayout {
    pub tensors: usize,
    pub operators: usize,
    pub inputs: usize,
    pub outputs: usize,
    pub buffers: usize,
    pub data: usize,
    pub end: usize,
}

impl SectionLayout {
    /// Computes section offsets and checks that the blob holds all of them.
    pub fn compute(header: &ModelHeader, available: usize) -> Result<Self, ModelError> {
        let mut cursor = HEADER_LEN;
        let mut section = |name: &'static str, count: u32, record: usize| {
            let start = cursor;
            let end = (count as usize)
                .checked_mul(record)
                .and_then(|len| start.checked_add(len))
                .filter(|&end| end <= available)
                .ok_or(ModelError::Truncated {
                    section: name,
                    needed: start.saturating_add((count as usize).saturating_mul(record)),
                    available,
                })?;
            cursor = end;
            Ok::<usize, ModelError>(start)
        };

        let tensors = section("tensor table", header.num_tensors, TENSOR_RECORD_LEN)?;
        let operators = section("operator table", header.num_operators, OPERATOR_RECORD_LEN)?;
        let inputs = section("input list", header.num_inputs, INDEX_LEN)?;
        let outputs = section("output list", header.num_outputs, INDEX_LEN)?;
        let buffers = section("buffer table", header.num_buffers, BUFFER_RECORD_LEN)?;
        let data = section("data section", header.data_len, 1)?;
        let end = cursor;

        Ok(Self {
            tensors,
            operators,
            inputs,
            outputs,
            buffers,
            data,
            end,
        })
    }
}

/// Reads a little-endian `u32` at `at`. Callers pass fixed-size records
/// whose length was checked against the blob.
#[inline]
pub(crate) fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ModelHeader {
        ModelHeader {
            schema_version: SCHEMA_VERSION,
            num_tensors: 2,
            num_operators: 1,
            num_inputs: 1,
            num_outputs: 1,
            num_buffers: 0,
            data_len: 0,
        }
    }

    #[test]
    fn test_header_bytes_parse_back() {
        let h = header();
        let bytes = h.to_bytes();
        assert_eq!(&bytes[..4], b"MIRT");
        assert_eq!(ModelHeader::parse(&bytes).unwrap(), h);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = header().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ModelHeader::parse(&bytes),
            Err(ModelError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_short_header() {
        let bytes = header().to_bytes();
        assert_eq!(
            ModelHeader::parse(&bytes[..20]),
            Err(ModelError::Truncated {
                section: "header",
                needed: 32,
                available: 20
            })
        );
    }

    #[test]
    fn test_layout_offsets() {
        let h = header();
        let total = HEADER_LEN + 2 * 24 + 28 + 4 + 4;
        let layout = SectionLayout::compute(&h, total).unwrap();
        assert_eq!(layout.tensors, 32);
        assert_eq!(layout.operators, 80);
        assert_eq!(layout.inputs, 108);
        assert_eq!(layout.outputs, 112);
        assert_eq!(layout.buffers, 116);
        assert_eq!(layout.end, total);
    }

    #[test]
    fn test_layout_truncated() {
        let h = header();
        let err = SectionLayout::compute(&h, 100).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Truncated {
                section: "operator table",
                ..
            }
        ));
    }

    #[test]
    fn test_layout_huge_counts_do_not_overflow() {
        let mut h = header();
        h.num_tensors = u32::MAX;
        assert!(SectionLayout::compute(&h, 64).is_err());
    }
}
