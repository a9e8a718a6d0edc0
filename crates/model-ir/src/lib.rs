// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The model descriptor: a compact little-endian blob holding a tensor
//! table, an operator list in execution order, graph input/output lists and
//! a constant data section.
//!
//! - [`Model`]: a zero-copy reader over the blob with a **type-state
//!   pattern** (`Loaded` → `Validated`).
//! - [`ModelBuilder`]: serializes blobs (used for fixtures and tests).
//! - [`OpCode`] / [`OperatorParams`]: the curated operator set.
//! - [`SchemaPolicy`] / [`SchemaReport`]: schema-version compatibility.
//! - [`format`]: wire layout constants, including [`SCHEMA_VERSION`].
//!
//! Converting from other model formats is out of scope; blobs are produced
//! by [`ModelBuilder`] or by an external exporter that writes this layout.
//!
//! # Example
//! ```
//! use model_ir::{Model, ModelBuilder, OpCode, OperatorParams, SchemaPolicy};
//! use tensor_core::{DType, Shape};
//!
//! let mut b = ModelBuilder::new();
//! let x = b.add_tensor(Shape::matrix(1, 4), DType::F32);
//! let y = b.add_tensor(Shape::matrix(1, 4), DType::F32);
//! b.add_operator(OpCode::Softmax, &[x], &[y], OperatorParams::softmax(1.0)).unwrap();
//! b.set_inputs(&[x]).set_outputs(&[y]);
//! let blob = b.build();
//!
//! let model = Model::from_bytes(&blob)?.validate(SchemaPolicy::Strict)?;
//! println!("{}", model.summary());
//! # Ok::<(), model_ir::ModelError>(())
//! ```

mod builder;
mod error;
pub mod format;
pub mod model;
mod opcode;
mod schema;

pub use builder::ModelBuilder;
pub use error::ModelError;
pub use format::{ModelHeader, SCHEMA_VERSION};
pub use model::{Loaded, Model, ModelState, OperatorNode, TensorMeta, Validated};
pub use opcode::{OpCode, OperatorParams};
pub use schema::{SchemaPolicy, SchemaReport};
