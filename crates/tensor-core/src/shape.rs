// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-capacity tensor shape descriptors.

use crate::TensorError;
use std::fmt;

/// Maximum number of dimensions a [`Shape`] can hold.
pub const MAX_RANK: usize = 4;

/// Describes the dimensionality of a tensor.
///
/// Shapes store their dimensions inline (`[usize; MAX_RANK]`), so they are
/// `Copy` and can be built, compared and passed around without a heap.
/// Unused trailing slots are always zero, which keeps the derived equality
/// and hashing correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: [usize; MAX_RANK],
    rank: usize,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(&[2, 3, 4]).unwrap();
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    ///
    /// # Errors
    /// Returns [`TensorError::RankTooLarge`] for more than [`MAX_RANK`] dims.
    pub fn new(dims: &[usize]) -> Result<Self, TensorError> {
        if dims.len() > MAX_RANK {
            return Err(TensorError::RankTooLarge {
                rank: dims.len(),
                max: MAX_RANK,
            });
        }
        let mut stored = [0usize; MAX_RANK];
        stored[..dims.len()].copy_from_slice(dims);
        Ok(Self {
            dims: stored,
            rank: dims.len(),
        })
    }

    /// Creates a rank-0 shape. Used as a placeholder; models never declare one.
    pub const fn scalar() -> Self {
        Self {
            dims: [0; MAX_RANK],
            rank: 0,
        }
    }

    /// Creates a 1-D shape.
    pub const fn vector(len: usize) -> Self {
        Self {
            dims: [len, 0, 0, 0],
            rank: 1,
        }
    }

    /// Creates a 2-D shape (matrix).
    pub const fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: [rows, cols, 0, 0],
            rank: 2,
        }
    }

    /// Returns the number of dimensions (rank).
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1. Saturates at `usize::MAX`;
    /// use [`checked_num_elements`](Self::checked_num_elements) where an
    /// overflow must be detected.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    /// Returns the total number of elements, or `None` on overflow.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims().iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.rank]
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims().get(index).copied()
    }

    /// Returns the innermost dimension, or `None` for a scalar.
    pub fn last_dim(&self) -> Option<usize> {
        self.dims().last().copied()
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    ///
    /// Saturates at `usize::MAX`.
    pub fn size_bytes(&self, dtype: crate::DType) -> usize {
        self.checked_size_bytes(dtype).unwrap_or(usize::MAX)
    }

    /// Memory footprint in bytes, or `None` if it does not fit in `usize`.
    pub fn checked_size_bytes(&self, dtype: crate::DType) -> Option<usize> {
        self.checked_num_elements()?.checked_mul(dtype.size_bytes())
    }

    /// Computes row-major (C-order) strides for this shape.
    ///
    /// Only the first `rank()` entries are meaningful.
    pub fn strides(&self) -> [usize; MAX_RANK] {
        let mut strides = [0usize; MAX_RANK];
        if self.rank == 0 {
            return strides;
        }
        strides[self.rank - 1] = 1;
        for i in (0..self.rank - 1).rev() {
            strides[i] = strides[i + 1].saturating_mul(self.dims[i + 1]);
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TensorError;

    fn try_from(dims: &[usize]) -> Result<Self, Self::Error> {
        Self::new(dims)
    }
}

impl serde::Serialize for Shape {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.dims())
    }
}

impl<'de> serde::Deserialize<'de> for Shape {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dims = Vec::<usize>::deserialize(deserializer)?;
        Shape::new(&dims).map_err(serde::de::Error::custom)
    }
}
