// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the interpreter and operator registry.

use memory_manager::MemoryError;
use model_ir::{ModelError, OpCode};
use tensor_core::TensorError;

use crate::ContractViolation;

/// Errors that can occur while preparing or running a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// The blob's schema version is not the compiled-in one (strict policy).
    #[error("model schema version {found} does not match supported version {expected}")]
    SchemaVersionMismatch { found: u32, expected: u32 },

    /// A tensor did not fit in the remaining arena space.
    #[error("arena exhausted while placing tensor {tensor}: {source}")]
    OutOfArenaMemory {
        tensor: usize,
        #[source]
        source: MemoryError,
    },

    /// No kernel is registered for an operator code.
    #[error("unsupported operator {opcode}{}", at_node(.node))]
    UnsupportedOperator { node: Option<usize>, opcode: OpCode },

    /// An input, output or tensor index is past the declared count.
    #[error("{kind} index {index} out of range (count: {count})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    /// A kernel failed during `invoke`.
    #[error("operator {node} ({op}) failed: {source}")]
    OperatorExecutionError {
        node: usize,
        op: &'static str,
        #[source]
        source: TensorError,
    },

    /// The model blob failed decoding or validation.
    #[error("invalid model: {0}")]
    InvalidModel(#[source] ModelError),

    /// Arena bookkeeping failed outside tensor placement.
    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    /// A view could not be built over a bound region.
    #[error("tensor error: {0}")]
    TensorError(#[from] TensorError),

    /// A tensor did not meet the caller's shape contract.
    #[error("tensor contract violated: {0}")]
    ContractViolation(#[from] ContractViolation),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<ModelError> for RuntimeError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::SchemaVersionMismatch { found, expected } => {
                Self::SchemaVersionMismatch { found, expected }
            }
            ModelError::IndexOutOfRange { kind, index, count } => {
                Self::IndexOutOfRange { kind, index, count }
            }
            other => Self::InvalidModel(other),
        }
    }
}

fn at_node(node: &Option<usize>) -> String {
    node.map(|n| format!(" at node {n}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_is_lifted() {
        let e: RuntimeError = ModelError::SchemaVersionMismatch {
            found: 2,
            expected: 3,
        }
        .into();
        assert_eq!(
            e,
            RuntimeError::SchemaVersionMismatch {
                found: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn test_other_model_errors_are_wrapped() {
        let e: RuntimeError = ModelError::EmptyGraph("outputs").into();
        assert!(matches!(e, RuntimeError::InvalidModel(ModelError::EmptyGraph(_))));
        assert!(e.to_string().starts_with("invalid model:"));
    }

    #[test]
    fn test_unsupported_operator_display() {
        let with_node = RuntimeError::UnsupportedOperator {
            node: Some(2),
            opcode: OpCode::Unknown(42),
        };
        assert_eq!(with_node.to_string(), "unsupported operator unknown(42) at node 2");

        let bare = RuntimeError::UnsupportedOperator {
            node: None,
            opcode: OpCode::Gelu,
        };
        assert_eq!(bare.to_string(), "unsupported operator gelu");
    }
}
