// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected (dense) layer.

use super::{require_f32, FusedActivation};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

/// Computes `output = act(input @ weightsᵀ + bias)`.
///
/// - `input` is `[batch, in]`
/// - `weights` is `[out, in]` (one row per output unit)
/// - `bias`, if present, is `[out]`
/// - `output` must be `[batch, out]`
///
/// Each output element is accumulated sequentially over the input axis, so
/// results are bit-identical across runs on the same target.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if dimensions are incompatible.
/// Returns [`TensorError::UnsupportedDType`] if any operand is not `F32`.
pub fn fully_connected(
    input: &TensorView<'_>,
    weights: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    activation: FusedActivation,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    const OP: &str = "fully_connected";

    require_f32(OP, input.dtype())?;
    require_f32(OP, weights.dtype())?;
    require_f32(OP, output.dtype())?;

    let in_shape = input.shape();
    let w_shape = weights.shape();
    if in_shape.rank() != 2 || w_shape.rank() != 2 || in_shape.dim(1) != w_shape.dim(1) {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: *in_shape,
            rhs: *w_shape,
        });
    }

    let dims = in_shape.dims();
    let (batch, k) = (dims[0], dims[1]);
    let n = w_shape.dims()[0];

    let expected = Shape::matrix(batch, n);
    if *output.shape() != expected {
        return Err(TensorError::ShapeMismatch {
            op: "fully_connected (output)",
            lhs: expected,
            rhs: *output.shape(),
        });
    }

    let b = match bias {
        Some(view) => {
            require_f32(OP, view.dtype())?;
            if view.num_elements() != n {
                return Err(TensorError::ShapeMismatch {
                    op: "fully_connected (bias)",
                    lhs: Shape::vector(n),
                    rhs: *view.shape(),
                });
            }
            Some(view.as_f32()?)
        }
        None => None,
    };

    let x = input.as_f32()?;
    let w = weights.as_f32()?;
    let y = output.as_f32_mut()?;

    for row in 0..batch {
        let x_row = &x[row * k..(row + 1) * k];
        let y_row = &mut y[row * n..(row + 1) * n];
        for (j, out) in y_row.iter_mut().enumerate() {
            let w_row = &w[j * k..(j + 1) * k];
            let mut acc = b.map_or(0.0, |b| b[j]);
            for (&xi, &wi) in x_row.iter().zip(w_row) {
                acc += xi * wi;
            }
            *out = activation.apply(acc);
        }
    }

    Ok(())
}
