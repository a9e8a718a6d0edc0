// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Element types, shapes, tensor views and numeric kernels for an
//! arena-backed inference engine on heap-less targets.
//!
//! This crate provides:
//! - [`DType`]: element data types understood by the model format.
//! - [`Shape`]: a fixed-capacity (rank ≤ [`MAX_RANK`]) shape that never
//!   touches the heap.
//! - [`TensorView`] / [`TensorViewMut`]: typed, shaped views over borrowed
//!   bytes (normally a region of the caller's arena).
//! - Kernels: fully-connected, softmax, element-wise activations, add,
//!   reshape, GELU.
//!
//! # Design Goals
//! - Zero-copy views: a tensor is a shape + dtype + borrowed slice.
//! - No heap allocation anywhere in the kernels.
//! - Every fallible path returns [`TensorError`]; nothing panics on bad
//!   shapes, dtypes or misaligned buffers.

mod dtype;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{
    add, fully_connected, gelu, logistic, relu, relu6, reshape, softmax, tanh, FusedActivation,
};
pub use shape::{Shape, MAX_RANK};
pub use tensor::{TensorView, TensorViewMut};
