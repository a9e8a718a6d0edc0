// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{require_f32, unary_f32, FusedActivation};
use crate::{TensorError, TensorView, TensorViewMut};

/// Element-wise `output = act(lhs + rhs)`. All three shapes must match;
/// there is no broadcasting.
pub fn add(
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    activation: FusedActivation,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    require_f32("add", rhs.dtype())?;
    if lhs.shape() != rhs.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "add",
            lhs: *lhs.shape(),
            rhs: *rhs.shape(),
        });
    }
    let a = lhs.as_f32()?;
    let b = rhs.as_f32()?;
    let dst = unary_f32("add", lhs, output)?;
    for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
        *d = activation.apply(x + y);
    }
    Ok(())
}
