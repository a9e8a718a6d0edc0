// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator codes and per-operator parameters.

use tensor_core::FusedActivation;

/// The computation an operator node performs.
///
/// Codes outside the curated set decode to [`OpCode::Unknown`] rather than
/// failing, so that an unregistered operator is reported by the registry
/// with its node index instead of by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    FullyConnected,
    Relu,
    Relu6,
    Logistic,
    Tanh,
    Softmax,
    Add,
    Reshape,
    Gelu,
    Unknown(u8),
}

impl OpCode {
    /// Every known opcode, in wire-code order.
    pub const ALL: [OpCode; 9] = [
        Self::FullyConnected,
        Self::Relu,
        Self::Relu6,
        Self::Logistic,
        Self::Tanh,
        Self::Softmax,
        Self::Add,
        Self::Reshape,
        Self::Gelu,
    ];

    /// Decodes a wire code.
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::FullyConnected,
            1 => Self::Relu,
            2 => Self::Relu6,
            3 => Self::Logistic,
            4 => Self::Tanh,
            5 => Self::Softmax,
            6 => Self::Add,
            7 => Self::Reshape,
            8 => Self::Gelu,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire code.
    pub const fn code(self) -> u8 {
        match self {
            Self::FullyConnected => 0,
            Self::Relu => 1,
            Self::Relu6 => 2,
            Self::Logistic => 3,
            Self::Tanh => 4,
            Self::Softmax => 5,
            Self::Add => 6,
            Self::Reshape => 7,
            Self::Gelu => 8,
            Self::Unknown(code) => code,
        }
    }

    /// Returns a human-readable label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullyConnected => "fully_connected",
            Self::Relu => "relu",
            Self::Relu6 => "relu6",
            Self::Logistic => "logistic",
            Self::Tanh => "tanh",
            Self::Softmax => "softmax",
            Self::Add => "add",
            Self::Reshape => "reshape",
            Self::Gelu => "gelu",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns `true` for codes outside the curated set.
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({code})"),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Parameters decoded from an operator record.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OperatorParams {
    /// Activation fused into the operator's output.
    pub activation: FusedActivation,
    /// Softmax logit scale. Zero for other operators.
    pub beta: f32,
}

impl Default for OperatorParams {
    fn default() -> Self {
        Self {
            activation: FusedActivation::None,
            beta: 0.0,
        }
    }
}

impl OperatorParams {
    /// Parameters carrying only a fused activation.
    pub const fn with_activation(activation: FusedActivation) -> Self {
        Self {
            activation,
            beta: 0.0,
        }
    }

    /// Softmax parameters with the given `beta`.
    pub const fn softmax(beta: f32) -> Self {
        Self {
            activation: FusedActivation::None,
            beta,
        }
    }
}
