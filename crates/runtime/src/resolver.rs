// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator registry: maps opcodes to kernels.
//!
//! The registry is a fixed table indexed by wire code, so registration and
//! lookup never allocate. Kernels are `&'static` trait objects, so a
//! resolver is a plain `Copy` table that interpreters borrow.

use crate::kernels;
use crate::RuntimeError;
use model_ir::{OpCode, OperatorParams};
use std::fmt;
use tensor_core::{TensorError, TensorView, TensorViewMut};

/// A numeric computation over arena-resident tensors.
///
/// Implementations must be deterministic, must write only to `outputs`,
/// and must not allocate.
pub trait Kernel: Send + Sync {
    /// Stable operator name used in logs, metrics and errors.
    fn name(&self) -> &'static str;

    /// Computes `outputs` from `inputs` in place.
    fn execute(
        &self,
        inputs: &[TensorView<'_>],
        outputs: &mut [TensorViewMut<'_>],
        params: &OperatorParams,
    ) -> Result<(), TensorError>;
}

const TABLE_LEN: usize = OpCode::ALL.len();

/// Opcode → kernel lookup table.
///
/// # Example
/// ```
/// use model_ir::OpCode;
/// use runtime::OpResolver;
///
/// let resolver = OpResolver::with_all_ops();
/// assert_eq!(resolver.resolve(OpCode::Softmax).unwrap().name(), "softmax");
/// assert!(resolver.resolve(OpCode::Unknown(99)).is_err());
/// ```
#[derive(Clone, Copy)]
pub struct OpResolver {
    table: [Option<&'static dyn Kernel>; TABLE_LEN],
}

impl OpResolver {
    /// Creates an empty resolver.
    pub const fn new() -> Self {
        Self {
            table: [None; TABLE_LEN],
        }
    }

    /// Creates a resolver with every built-in kernel registered.
    pub fn with_all_ops() -> Self {
        let mut resolver = Self::new();
        let builtins: [(OpCode, &'static dyn Kernel); TABLE_LEN] = [
            (OpCode::FullyConnected, &kernels::FULLY_CONNECTED),
            (OpCode::Relu, &kernels::RELU),
            (OpCode::Relu6, &kernels::RELU6),
            (OpCode::Logistic, &kernels::LOGISTIC),
            (OpCode::Tanh, &kernels::TANH),
            (OpCode::Softmax, &kernels::SOFTMAX),
            (OpCode::Add, &kernels::ADD),
            (OpCode::Reshape, &kernels::RESHAPE),
            (OpCode::Gelu, &kernels::GELU),
        ];
        for (opcode, kernel) in builtins {
            if let Some(slot) = Self::slot(opcode) {
                resolver.table[slot] = Some(kernel);
            }
        }
        resolver
    }

    /// Registers `kernel` for `opcode`, replacing any existing entry.
    ///
    /// # Errors
    /// [`RuntimeError::UnsupportedOperator`] for [`OpCode::Unknown`].
    pub fn register(
        &mut self,
        opcode: OpCode,
        kernel: &'static dyn Kernel,
    ) -> Result<&mut Self, RuntimeError> {
        let slot = Self::slot(opcode)
            .ok_or(RuntimeError::UnsupportedOperator { node: None, opcode })?;
        if let Some(previous) = self.table[slot].replace(kernel) {
            tracing::debug!(
                %opcode,
                previous = previous.name(),
                kernel = kernel.name(),
                "Kernel replaced"
            );
        }
        Ok(self)
    }

    /// Returns the kernel registered for `opcode`.
    ///
    /// # Errors
    /// [`RuntimeError::UnsupportedOperator`] if nothing is registered.
    pub fn resolve(&self, opcode: OpCode) -> Result<&'static dyn Kernel, RuntimeError> {
        Self::slot(opcode)
            .and_then(|slot| self.table[slot])
            .ok_or(RuntimeError::UnsupportedOperator { node: None, opcode })
    }

    /// Returns `true` if a kernel is registered for `opcode`.
    pub fn is_registered(&self, opcode: OpCode) -> bool {
        self.resolve(opcode).is_ok()
    }

    /// Number of registered opcodes.
    pub fn num_registered(&self) -> usize {
        self.table.iter().filter(|k| k.is_some()).count()
    }

    fn slot(opcode: OpCode) -> Option<usize> {
        if opcode.is_unknown() {
            None
        } else {
            Some(opcode.code() as usize)
        }
    }
}

impl Default for OpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OpResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                OpCode::ALL
                    .iter()
                    .zip(self.table.iter())
                    .filter_map(|(op, k)| k.map(|k| (op.as_str(), k.name()))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Kernel for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn execute(
            &self,
            inputs: &[TensorView<'_>],
            outputs: &mut [TensorViewMut<'_>],
            _params: &OperatorParams,
        ) -> Result<(), TensorError> {
            let src = inputs[0].as_f32()?;
            for (d, s) in outputs[0].as_f32_mut()?.iter_mut().zip(src) {
                *d = s * 2.0;
            }
            Ok(())
        }
    }

    static DOUBLER: Doubler = Doubler;

    #[test]
    fn test_empty_resolver() {
        let r = OpResolver::new();
        assert_eq!(r.num_registered(), 0);
        assert_eq!(
            r.resolve(OpCode::Relu).err(),
            Some(RuntimeError::UnsupportedOperator {
                node: None,
                opcode: OpCode::Relu
            })
        );
    }

    #[test]
    fn test_all_ops_registered() {
        let r = OpResolver::with_all_ops();
        assert_eq!(r.num_registered(), OpCode::ALL.len());
        for op in OpCode::ALL {
            assert_eq!(r.resolve(op).unwrap().name(), op.as_str());
        }
    }

    #[test]
    fn test_unknown_is_never_resolved() {
        let mut r = OpResolver::with_all_ops();
        assert!(!r.is_registered(OpCode::Unknown(42)));
        assert!(matches!(
            r.register(OpCode::Unknown(42), &DOUBLER),
            Err(RuntimeError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut r = OpResolver::with_all_ops();
        r.register(OpCode::Relu, &DOUBLER).unwrap();
        assert_eq!(r.resolve(OpCode::Relu).unwrap().name(), "doubler");
        assert_eq!(r.num_registered(), OpCode::ALL.len());
    }

    #[test]
    fn test_register_chains() {
        let mut r = OpResolver::new();
        r.register(OpCode::Relu, &kernels::RELU)
            .unwrap()
            .register(OpCode::Softmax, &kernels::SOFTMAX)
            .unwrap();
        assert_eq!(r.num_registered(), 2);
        assert!(r.is_registered(OpCode::Softmax));
        assert!(!r.is_registered(OpCode::Add));
    }
}
