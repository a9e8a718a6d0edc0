// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Numeric kernels.
//!
//! Every kernel reads from borrowed [`TensorView`]s and writes into a
//! caller-provided [`TensorViewMut`], so nothing here allocates. Output
//! shapes are checked up front and reported as [`TensorError`]s.

mod activation;
mod add_op;
mod fully_connected;
mod gelu_op;
mod reshape_op;
mod softmax_op;

pub use activation::{logistic, relu, relu6, tanh, FusedActivation};
pub use add_op::add;
pub use fully_connected::fully_connected;
pub use gelu_op::gelu;
pub use reshape_op::reshape;
pub use softmax_op::softmax;

use crate::{DType, TensorError, TensorView, TensorViewMut};

/// Checks that a view holds `F32` data, reporting `op` on failure.
pub(crate) fn require_f32(op: &'static str, dtype: DType) -> Result<(), TensorError> {
    if dtype != DType::F32 {
        return Err(TensorError::UnsupportedDType { op, dtype });
    }
    Ok(())
}

/// Shared preamble of the element-wise kernels: same shape, both `F32`.
pub(crate) fn unary_f32<'o>(
    op: &'static str,
    input: &TensorView<'_>,
    output: &'o mut TensorViewMut<'_>,
) -> Result<&'o mut [f32], TensorError> {
    require_f32(op, input.dtype())?;
    require_f32(op, output.dtype())?;
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: *input.shape(),
            rhs: *output.shape(),
        });
    }
    output.as_f32_mut()
}

/// Applies `f` element-wise from `input` into `output`.
pub(crate) fn map_f32(
    op: &'static str,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
    f: impl Fn(f32) -> f32,
) -> Result<(), TensorError> {
    let src = input.as_f32()?;
    let dst = unary_f32(op, input, output)?;
    for (d, &x) in dst.iter_mut().zip(src) {
        *d = f(x);
    }
    Ok(())
}
