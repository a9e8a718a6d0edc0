// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise activations and the fused-activation selector.

use super::map_f32;
use crate::{TensorError, TensorView, TensorViewMut};

/// Activation applied in place to a kernel's output before it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusedActivation {
    #[default]
    None,
    Relu,
    Relu6,
}

impl FusedActivation {
    /// Wire code used by the model format.
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Relu => 1,
            Self::Relu6 => 2,
        }
    }

    /// Decodes a wire code. Unknown codes yield `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Relu),
            2 => Some(Self::Relu6),
            _ => None,
        }
    }

    /// Applies the activation to a single value.
    #[inline(always)]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::None => x,
            Self::Relu => x.max(0.0),
            Self::Relu6 => x.clamp(0.0, 6.0),
        }
    }

    /// Applies the activation to every element of `values`.
    pub fn apply_slice(self, values: &mut [f32]) {
        if self == Self::None {
            return;
        }
        values.iter_mut().for_each(|x| *x = self.apply(*x));
    }
}

/// `max(x, 0)` element-wise.
pub fn relu(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    map_f32("relu", input, output, |x| x.max(0.0))
}

/// `min(max(x, 0), 6)` element-wise.
pub fn relu6(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    map_f32("relu6", input, output, |x| x.clamp(0.0, 6.0))
}

/// Logistic sigmoid `1 / (1 + exp(-x))` element-wise.
pub fn logistic(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    map_f32("logistic", input, output, |x| 1.0 / (1.0 + (-x).exp()))
}

/// Hyperbolic tangent element-wise.
pub fn tanh(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    map_f32("tanh", input, output, f32::tanh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    fn run(
        f: fn(&TensorView<'_>, &mut TensorViewMut<'_>) -> Result<(), TensorError>,
        src: &[f32],
    ) -> Vec<f32> {
        let mut dst = vec![0.0f32; src.len()];
        let shape = Shape::vector(src.len());
        let input = TensorView::from_f32(shape, src).unwrap();
        let mut output = TensorViewMut::from_f32(shape, &mut dst).unwrap();
        f(&input, &mut output).unwrap();
        dst
    }

    #[test]
    fn test_relu_and_relu6() {
        assert_eq!(run(relu, &[-1.0, 0.0, 2.5, 9.0]), vec![0.0, 0.0, 2.5, 9.0]);
        assert_eq!(run(relu6, &[-1.0, 0.0, 2.5, 9.0]), vec![0.0, 0.0, 2.5, 6.0]);
    }

    #[test]
    fn test_logistic() {
        let r = run(logistic, &[0.0, 20.0, -20.0]);
        assert!((r[0] - 0.5).abs() < 1e-6);
        assert!(r[1] > 0.999);
        assert!(r[2] < 0.001);
    }

    #[test]
    fn test_tanh_is_odd() {
        let r = run(tanh, &[0.5, -0.5]);
        assert!((r[0] + r[1]).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch() {
        let src = [1.0f32; 3];
        let mut dst = [0.0f32; 4];
        let input = TensorView::from_f32(Shape::vector(3), &src).unwrap();
        let mut output = TensorViewMut::from_f32(Shape::vector(4), &mut dst).unwrap();
        assert!(matches!(
            relu(&input, &mut output),
            Err(TensorError::ShapeMismatch { op: "relu", .. })
        ));
    }

    #[test]
    fn test_fused_codes() {
        for act in [FusedActivation::None, FusedActivation::Relu, FusedActivation::Relu6] {
            assert_eq!(FusedActivation::from_code(act.code()), Some(act));
        }
        assert_eq!(FusedActivation::from_code(7), None);
    }

    #[test]
    fn test_fused_apply_slice() {
        let mut v = [-3.0f32, 3.0, 8.0];
        FusedActivation::Relu6.apply_slice(&mut v);
        assert_eq!(v, [0.0, 3.0, 6.0]);
    }
}
