// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use crate::{TensorError, TensorView, TensorViewMut};

/// Copies `input` into `output` under a new shape.
///
/// Row-major order is preserved, so this is a plain byte copy. The dtypes
/// and element counts of the two views must match.
pub fn reshape(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    if input.dtype() != output.dtype() {
        return Err(TensorError::UnsupportedDType {
            op: "reshape",
            dtype: output.dtype(),
        });
    }
    if input.num_elements() != output.num_elements() {
        return Err(TensorError::ShapeMismatch {
            op: "reshape",
            lhs: *input.shape(),
            rhs: *output.shape(),
        });
    }
    output.as_bytes_mut().copy_from_slice(input.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_reshape_flattens() {
        let src = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut dst = [0.0f32; 6];
        let input = TensorView::from_f32(Shape::matrix(2, 3), &src).unwrap();
        let mut output = TensorViewMut::from_f32(Shape::matrix(1, 6), &mut dst).unwrap();
        reshape(&input, &mut output).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_reshape_count_mismatch() {
        let src = [0.0f32; 6];
        let mut dst = [0.0f32; 4];
        let input = TensorView::from_f32(Shape::matrix(2, 3), &src).unwrap();
        let mut output = TensorViewMut::from_f32(Shape::matrix(2, 2), &mut dst).unwrap();
        assert!(matches!(
            reshape(&input, &mut output),
            Err(TensorError::ShapeMismatch { op: "reshape", .. })
        ));
    }
}
