// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The interpreter that runs a validated model inside a caller-owned arena.
//!
//! The runtime takes:
//! - A validated [`model_ir::Model`].
//! - An [`OpResolver`] mapping opcodes to [`Kernel`]s.
//! - An [`memory_manager::Arena`] over the caller's buffer.
//!
//! It places every tensor in the arena once, then runs the operator list
//! as many times as asked without allocating.
//!
//! # Type-State Pipeline
//! ```text
//! Interpreter<Created> → Interpreter<Ready> → invoke() → invoke() → …
//! ```
//! Transitions are compile-time checked.
//!
//! # Execution Model
//! Single-threaded, synchronous, run-to-completion. There is no async
//! runtime and no locking; the interpreter owns the arena outright.

mod config;
mod contract;
mod error;
mod interpreter;
pub mod kernels;
mod metrics;
mod resolver;
pub mod terrain;

pub use config::{InterpreterConfig, RuntimeConfig};
pub use contract::{ContractViolation, TensorContract, TERRAIN_INPUT, TERRAIN_OUTPUT};
pub use error::RuntimeError;
pub use interpreter::{Created, Interpreter, InterpreterState, Ready, TENSOR_ALIGNMENT};
pub use metrics::{InvokeMetrics, OperatorMetrics};
pub use resolver::{Kernel, OpResolver};
