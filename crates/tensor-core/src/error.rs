// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::{DType, Shape};

/// Errors that can occur while building tensor views or running kernels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// `shape × dtype` does not fit in `usize`.
    #[error("byte size of shape {shape} overflows")]
    SizeOverflow { shape: Shape },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The requested data type is not supported for this operation.
    #[error("unsupported dtype {dtype:?} for operation {op}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    /// A shape was requested with more dimensions than [`crate::MAX_RANK`].
    #[error("rank {rank} exceeds the maximum supported rank {max}")]
    RankTooLarge { rank: usize, max: usize },

    /// The backing bytes are not aligned for the element type.
    #[error("buffer for {op} is not aligned to {align} bytes")]
    Misaligned { op: &'static str, align: usize },

    /// A kernel received the wrong number of input or output tensors.
    #[error("{op} expects {expected} {role} tensor(s), got {actual}")]
    ArityMismatch {
        op: &'static str,
        role: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A numeric computation failed (e.g., NaN or overflow).
    #[error("numeric error in {op}: {detail}")]
    Numeric {
        op: &'static str,
        detail: &'static str,
    },
}
