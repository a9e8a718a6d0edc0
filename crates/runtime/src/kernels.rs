// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Built-in kernels.
//!
//! Each kernel is a zero-sized or `fn`-pointer static adapting a
//! `tensor-core` op to the [`Kernel`] calling convention: check arity,
//! unpack the views, forward the parameters.

use crate::resolver::Kernel;
use model_ir::OperatorParams;
use tensor_core::{TensorError, TensorView, TensorViewMut};

/// `fully_connected(input, weights, [bias]) -> output`.
#[derive(Debug, Clone, Copy)]
pub struct FullyConnectedKernel;

/// `softmax(input) -> output` along the last axis, scaled by `params.beta`.
#[derive(Debug, Clone, Copy)]
pub struct SoftmaxKernel;

/// `add(lhs, rhs) -> output` with a fused activation.
#[derive(Debug, Clone, Copy)]
pub struct AddKernel;

type UnaryFn = fn(&TensorView<'_>, &mut TensorViewMut<'_>) -> Result<(), TensorError>;

/// A one-input, one-output kernel with no parameters.
#[derive(Clone, Copy)]
pub struct UnaryKernel {
    name: &'static str,
    func: UnaryFn,
}

impl std::fmt::Debug for UnaryKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UnaryKernel").field(&self.name).finish()
    }
}

pub static FULLY_CONNECTED: FullyConnectedKernel = FullyConnectedKernel;
pub static SOFTMAX: SoftmaxKernel = SoftmaxKernel;
pub static ADD: AddKernel = AddKernel;
pub static RELU: UnaryKernel = UnaryKernel::new("relu", tensor_core::relu);
pub static RELU6: UnaryKernel = UnaryKernel::new("relu6", tensor_core::relu6);
pub static LOGISTIC: UnaryKernel = UnaryKernel::new("logistic", tensor_core::logistic);
pub static TANH: UnaryKernel = UnaryKernel::new("tanh", tensor_core::tanh);
pub static GELU: UnaryKernel = UnaryKernel::new("gelu", tensor_core::gelu);
pub static RESHAPE: UnaryKernel = UnaryKernel::new("reshape", tensor_core::reshape);

// ── Arity helpers ──────────────────────────────────────────────────

fn arity_error(op: &'static str, role: &'static str, expected: usize, actual: usize) -> TensorError {
    TensorError::ArityMismatch {
        op,
        role,
        expected,
        actual,
    }
}

fn single_output<'o, 'v>(
    op: &'static str,
    outputs: &'o mut [TensorViewMut<'v>],
) -> Result<&'o mut TensorViewMut<'v>, TensorError> {
    match outputs {
        [output] => Ok(output),
        other => Err(arity_error(op, "output", 1, other.len())),
    }
}

// ── Kernel impls ───────────────────────────────────────────────────

impl Kernel for FullyConnectedKernel {
    fn name(&self) -> &'static str {
        "fully_connected"
    }

    fn execute(
        &self,
        inputs: &[TensorView<'_>],
        outputs: &mut [TensorViewMut<'_>],
        params: &OperatorParams,
    ) -> Result<(), TensorError> {
        let (input, weights, bias) = match inputs {
            [input, weights] => (input, weights, None),
            [input, weights, bias] => (input, weights, Some(bias)),
            other => return Err(arity_error(self.name(), "input", 2, other.len())),
        };
        let output = single_output(self.name(), outputs)?;
        tensor_core::fully_connected(input, weights, bias, params.activation, output)
    }
}

impl Kernel for SoftmaxKernel {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn execute(
        &self,
        inputs: &[TensorView<'_>],
        outputs: &mut [TensorViewMut<'_>],
        params: &OperatorParams,
    ) -> Result<(), TensorError> {
        let [input] = inputs else {
            return Err(arity_error(self.name(), "input", 1, inputs.len()));
        };
        let output = single_output(self.name(), outputs)?;
        tensor_core::softmax(input, params.beta, output)
    }
}

impl Kernel for AddKernel {
    fn name(&self) -> &'static str {
        "add"
    }

    fn execute(
        &self,
        inputs: &[TensorView<'_>],
        outputs: &mut [TensorViewMut<'_>],
        params: &OperatorParams,
    ) -> Result<(), TensorError> {
        let [lhs, rhs] = inputs else {
            return Err(arity_error(self.name(), "input", 2, inputs.len()));
        };
        let output = single_output(self.name(), outputs)?;
        tensor_core::add(lhs, rhs, params.activation, output)
    }
}

impl UnaryKernel {
    /// Wraps `func` under `name`.
    pub const fn new(name: &'static str, func: UnaryFn) -> Self {
        Self { name, func }
    }
}

impl Kernel for UnaryKernel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(
        &self,
        inputs: &[TensorView<'_>],
        outputs: &mut [TensorViewMut<'_>],
        _params: &OperatorParams,
    ) -> Result<(), TensorError> {
        let [input] = inputs else {
            return Err(arity_error(self.name, "input", 1, inputs.len()));
        };
        let output = single_output(self.name, outputs)?;
        (self.func)(input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{FusedActivation, Shape};

    #[test]
    fn test_fully_connected_with_bias_and_relu() {
        let x = [1.0f32, 2.0];
        let w = [1.0f32, 1.0, -1.0, -1.0];
        let b = [0.5f32, 0.5];
        let mut y = [0f32; 2];

        let inputs = [
            TensorView::from_f32(Shape::matrix(1, 2), &x).unwrap(),
            TensorView::from_f32(Shape::matrix(2, 2), &w).unwrap(),
            TensorView::from_f32(Shape::vector(2), &b).unwrap(),
        ];
        let mut outputs = [TensorViewMut::from_f32(Shape::matrix(1, 2), &mut y).unwrap()];
        let params = OperatorParams::with_activation(FusedActivation::Relu);

        FULLY_CONNECTED.execute(&inputs, &mut outputs, &params).unwrap();
        assert_eq!(outputs[0].as_f32().unwrap(), &[3.5, 0.0]);
    }

    #[test]
    fn test_fully_connected_arity() {
        let x = [1.0f32];
        let mut y = [0f32];
        let inputs = [TensorView::from_f32(Shape::matrix(1, 1), &x).unwrap()];
        let mut outputs = [TensorViewMut::from_f32(Shape::matrix(1, 1), &mut y).unwrap()];

        let err = FULLY_CONNECTED
            .execute(&inputs, &mut outputs, &OperatorParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            TensorError::ArityMismatch {
                op: "fully_connected",
                role: "input",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_softmax_uses_beta() {
        let x = [0.0f32, 0.0];
        let mut y = [0f32; 2];
        let inputs = [TensorView::from_f32(Shape::matrix(1, 2), &x).unwrap()];
        let mut outputs = [TensorViewMut::from_f32(Shape::matrix(1, 2), &mut y).unwrap()];

        SOFTMAX
            .execute(&inputs, &mut outputs, &OperatorParams::softmax(1.0))
            .unwrap();
        assert_eq!(outputs[0].as_f32().unwrap(), &[0.5, 0.5]);

        let err = SOFTMAX
            .execute(&inputs, &mut outputs, &OperatorParams::softmax(f32::NAN))
            .unwrap_err();
        assert!(matches!(err, TensorError::Numeric { op: "softmax", .. }));
    }

    #[test]
    fn test_unary_kernel_rejects_extra_outputs() {
        let x = [1.0f32];
        let (mut a, mut b) = ([0f32], [0f32]);
        let inputs = [TensorView::from_f32(Shape::vector(1), &x).unwrap()];
        let mut outputs = [
            TensorViewMut::from_f32(Shape::vector(1), &mut a).unwrap(),
            TensorViewMut::from_f32(Shape::vector(1), &mut b).unwrap(),
        ];
        let err = RELU
            .execute(&inputs, &mut outputs, &OperatorParams::default())
            .unwrap_err();
        assert!(matches!(
            err,
            TensorError::ArityMismatch { role: "output", actual: 2, .. }
        ));
    }

    #[test]
    fn test_add_kernel() {
        let l = [1.0f32, -3.0];
        let r = [1.0f32, 1.0];
        let mut y = [0f32; 2];
        let inputs = [
            TensorView::from_f32(Shape::vector(2), &l).unwrap(),
            TensorView::from_f32(Shape::vector(2), &r).unwrap(),
        ];
        let mut outputs = [TensorViewMut::from_f32(Shape::vector(2), &mut y).unwrap()];
        ADD.execute(
            &inputs,
            &mut outputs,
            &OperatorParams::with_activation(FusedActivation::Relu),
        )
        .unwrap();
        assert_eq!(outputs[0].as_f32().unwrap(), &[2.0, 0.0]);
    }
}
