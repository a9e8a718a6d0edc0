// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax activation operation.

use super::unary_f32;
use crate::{TensorError, TensorView, TensorViewMut};

/// Computes softmax along the last dimension:
/// `output[i] = exp(beta * (x[i] - max)) / sum(exp(beta * (x - max)))`.
///
/// Uses the numerically stable variant that subtracts the row maximum
/// before exponentiation to prevent overflow. `beta` scales the logits;
/// `1.0` is the plain softmax.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
/// Returns [`TensorError::UnsupportedDType`] if the dtype is not `F32`.
/// Returns [`TensorError::Numeric`] if `beta` is not finite, or if a row
/// holds NaN or infinite logits.
pub fn softmax(
    input: &TensorView<'_>,
    beta: f32,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    if !beta.is_finite() {
        return Err(TensorError::Numeric {
            op: "softmax",
            detail: "beta must be finite",
        });
    }

    let src = input.as_f32()?;
    let last_dim = input.shape().last_dim().unwrap_or(1);
    let dst = unary_f32("softmax", input, output)?;

    if last_dim == 0 {
        return Ok(());
    }

    for (row_src, row_dst) in src.chunks_exact(last_dim).zip(dst.chunks_exact_mut(last_dim)) {
        let max_val = row_src.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for (d, &s) in row_dst.iter_mut().zip(row_src) {
            let e = (beta * (s - max_val)).exp();
            *d = e;
            sum += e;
        }

        if !(sum.is_finite() && sum > 0.0) {
            return Err(TensorError::Numeric {
                op: "softmax",
                detail: "logits are not finite",
            });
        }
        let inv_sum = 1.0 / sum;
        row_dst.iter_mut().for_each(|d| *d *= inv_sum);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    fn approx_eq(a: &[f32], b: &[f32], tol: f32) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    fn run(shape: Shape, src: &[f32], beta: f32) -> Vec<f32> {
        let mut dst = vec![0.0f32; src.len()];
        let input = TensorView::from_f32(shape, src).unwrap();
        let mut output = TensorViewMut::from_f32(shape, &mut dst).unwrap();
        softmax(&input, beta, &mut output).unwrap();
        dst
    }

    #[test]
    fn test_softmax_uniform() {
        let r = run(Shape::matrix(1, 4), &[1.0; 4], 1.0);
        assert!(approx_eq(&r, &[0.25; 4], 1e-5));
    }

    #[test]
    fn test_softmax_sums_to_one_and_monotonic() {
        let r = run(Shape::vector(5), &[1.0, 2.0, 3.0, 4.0, 5.0], 1.0);
        let sum: f32 = r.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(r.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_softmax_2d_rows() {
        let r = run(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0], 1.0);
        let sum0: f32 = r[0..3].iter().sum();
        assert!((sum0 - 1.0).abs() < 1e-5);
        assert!(approx_eq(&r[3..6], &[1.0 / 3.0; 3], 1e-5));
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let r = run(Shape::vector(3), &[1000.0, 1001.0, 1002.0], 1.0);
        assert!(r.iter().all(|x| x.is_finite()));
        assert!((r.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_softmax_beta_sharpens() {
        let plain = run(Shape::vector(2), &[0.0, 1.0], 1.0);
        let sharp = run(Shape::vector(2), &[0.0, 1.0], 4.0);
        assert!(sharp[1] > plain[1]);
        let flat = run(Shape::vector(2), &[0.0, 1.0], 0.0);
        assert!(approx_eq(&flat, &[0.5, 0.5], 1e-6));
    }

    #[test]
    fn test_softmax_rejects_nan_beta() {
        let src = [0.0f32; 2];
        let mut dst = [0.0f32; 2];
        let input = TensorView::from_f32(Shape::vector(2), &src).unwrap();
        let mut output = TensorViewMut::from_f32(Shape::vector(2), &mut dst).unwrap();
        assert!(matches!(
            softmax(&input, f32::NAN, &mut output),
            Err(TensorError::Numeric { .. })
        ));
    }

    #[test]
    fn test_softmax_rejects_non_finite_logits() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let src = [bad, bad, bad];
            let mut dst = [0.0f32; 3];
            let input = TensorView::from_f32(Shape::vector(3), &src).unwrap();
            let mut output = TensorViewMut::from_f32(Shape::vector(3), &mut dst).unwrap();
            assert!(matches!(
                softmax(&input, 1.0, &mut output),
                Err(TensorError::Numeric { op: "softmax", .. })
            ));
        }

        let src = [0.0, f32::NAN, 1.0];
        let mut dst = [0.0f32; 3];
        let input = TensorView::from_f32(Shape::vector(3), &src).unwrap();
        let mut output = TensorViewMut::from_f32(Shape::vector(3), &mut dst).unwrap();
        assert!(softmax(&input, 1.0, &mut output).is_err());
    }
}
