// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model decoding, building and validation.
//!
//! Decoding and validation errors carry only indices and `&'static str`
//! reasons so that they can be raised without touching the heap.

/// Errors that can occur when reading, building or validating a model blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The blob does not start with the `MIRT` magic.
    #[error("invalid model magic {found:02x?}, expected \"MIRT\"")]
    InvalidMagic { found: [u8; 4] },

    /// The blob ends before a section the header declares.
    #[error("model blob truncated in {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// The blob's schema version differs from the compiled-in version.
    #[error("model schema version {found} does not match supported version {expected}")]
    SchemaVersionMismatch { found: u32, expected: u32 },

    /// A tensor record is malformed.
    #[error("invalid tensor {index}: {reason}")]
    InvalidTensor { index: usize, reason: &'static str },

    /// An operator record is malformed.
    #[error("invalid operator {node}: {reason}")]
    InvalidOperator { node: usize, reason: &'static str },

    /// A constant buffer record points outside the data section.
    #[error("invalid buffer {index}: {reason}")]
    InvalidBuffer { index: usize, reason: &'static str },

    /// An index into one of the model tables is out of range.
    #[error("{kind} index {index} out of range (count: {count})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    /// The operator graph violates single assignment or ordering.
    #[error("invalid model graph at tensor {tensor}: {reason}")]
    InvalidGraph { tensor: usize, reason: &'static str },

    /// The graph declares no inputs or no outputs.
    #[error("model graph declares no {0}")]
    EmptyGraph(&'static str),

    /// A schema policy string could not be parsed.
    #[error("unknown schema policy '{0}': expected 'strict' or 'warn'")]
    UnknownSchemaPolicy(String),
}
