// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Consumer-side tensor contracts.
//!
//! A deployed model is only useful if its input and output tensors have the
//! layout the caller was compiled against. A [`TensorContract`] states that
//! layout and checks a bound view (or declared metadata) against it.

use model_ir::TensorMeta;
use tensor_core::{DType, Shape, TensorView};

/// Expected rank, dims and dtype of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorContract {
    pub name: &'static str,
    pub dims: &'static [usize],
    pub dtype: DType,
}

/// Terrain classifier input: one row of 48 features.
pub const TERRAIN_INPUT: TensorContract = TensorContract::new("terrain input", &[1, 48], DType::F32);

/// Terrain classifier output: one row of 4 class probabilities.
pub const TERRAIN_OUTPUT: TensorContract =
    TensorContract::new("terrain output", &[1, 4], DType::F32);

/// How a tensor broke its contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("{contract}: expected rank {expected}, got {actual}")]
    Rank {
        contract: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{contract}: expected dims {expected:?}, got {actual}")]
    Dims {
        contract: &'static str,
        expected: &'static [usize],
        actual: Shape,
    },

    #[error("{contract}: expected dtype {expected}, got {actual}")]
    DType {
        contract: &'static str,
        expected: DType,
        actual: DType,
    },
}

impl TensorContract {
    pub const fn new(name: &'static str, dims: &'static [usize], dtype: DType) -> Self {
        Self { name, dims, dtype }
    }

    /// Expected rank.
    pub const fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Expected element count.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Checks a bound view.
    pub fn check(&self, view: &TensorView<'_>) -> Result<(), ContractViolation> {
        self.check_parts(view.shape(), view.dtype())
    }

    /// Checks declared metadata, before any arena exists.
    pub fn check_meta(&self, meta: &TensorMeta) -> Result<(), ContractViolation> {
        self.check_parts(&meta.shape, meta.dtype)
    }

    fn check_parts(&self, shape: &Shape, dtype: DType) -> Result<(), ContractViolation> {
        if shape.rank() != self.rank() {
            return Err(ContractViolation::Rank {
                contract: self.name,
                expected: self.rank(),
                actual: shape.rank(),
            });
        }
        if shape.dims() != self.dims {
            return Err(ContractViolation::Dims {
                contract: self.name,
                expected: self.dims,
                actual: *shape,
            });
        }
        if dtype != self.dtype {
            return Err(ContractViolation::DType {
                contract: self.name,
                expected: self.dtype,
                actual: dtype,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_input_accepts_matching_view() {
        let data = [0f32; 48];
        let v = TensorView::from_f32(Shape::matrix(1, 48), &data).unwrap();
        assert_eq!(TERRAIN_INPUT.check(&v), Ok(()));
        assert_eq!(TERRAIN_INPUT.num_elements(), 48);
    }

    #[test]
    fn test_rank_checked_first() {
        let data = [0f32; 48];
        let v = TensorView::from_f32(Shape::vector(48), &data).unwrap();
        assert_eq!(
            TERRAIN_INPUT.check(&v),
            Err(ContractViolation::Rank {
                contract: "terrain input",
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_dims_mismatch() {
        let data = [0f32; 4];
        let v = TensorView::from_f32(Shape::matrix(4, 1), &data).unwrap();
        let err = TERRAIN_OUTPUT.check(&v).unwrap_err();
        assert!(matches!(err, ContractViolation::Dims { .. }));
        assert_eq!(
            err.to_string(),
            "terrain output: expected dims [1, 4], got [4, 1]"
        );
    }

    #[test]
    fn test_dtype_mismatch() {
        let meta = TensorMeta {
            shape: Shape::matrix(1, 4),
            dtype: DType::I8,
            buffer: None,
        };
        assert!(matches!(
            TERRAIN_OUTPUT.check_meta(&meta),
            Err(ContractViolation::DType {
                expected: DType::F32,
                actual: DType::I8,
                ..
            })
        ));
    }
}
