// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Serializer for model blobs.
//!
//! [`ModelBuilder`] writes the binary layout described in [`crate::format`].
//! It records structure faithfully and leaves semantic checks to
//! [`crate::Model::validate`], so tests can also produce deliberately broken
//! graphs.

use crate::format::{
    ModelHeader, MAX_OPERATOR_INPUTS, MAX_OPERATOR_OUTPUTS, NO_BUFFER, SCHEMA_VERSION,
};
use crate::{ModelError, OpCode, OperatorParams};
use tensor_core::{DType, Shape, MAX_RANK};

#[derive(Debug, Clone)]
struct TensorEntry {
    shape: Shape,
    dtype: DType,
    buffer: u32,
}

#[derive(Debug, Clone)]
struct OperatorEntry {
    opcode: OpCode,
    params: OperatorParams,
    inputs: [u32; MAX_OPERATOR_INPUTS],
    outputs: [u32; MAX_OPERATOR_OUTPUTS],
    num_inputs: u8,
    num_outputs: u8,
}

/// Builds a model blob in memory.
///
/// # Example
/// ```
/// use model_ir::{Model, ModelBuilder, OpCode, OperatorParams, SchemaPolicy};
/// use tensor_core::{DType, Shape};
///
/// let mut b = ModelBuilder::new();
/// let x = b.add_tensor(Shape::matrix(1, 3), DType::F32);
/// let y = b.add_tensor(Shape::matrix(1, 3), DType::F32);
/// b.add_operator(OpCode::Relu, &[x], &[y], OperatorParams::default()).unwrap();
/// b.set_inputs(&[x]);
/// b.set_outputs(&[y]);
///
/// let blob = b.build();
/// let model = Model::from_bytes(&blob).unwrap().validate(SchemaPolicy::Strict).unwrap();
/// assert_eq!(model.num_operators(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    schema_version: u32,
    tensors: Vec<TensorEntry>,
    operators: Vec<OperatorEntry>,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
    buffers: Vec<(u32, u32)>,
    data: Vec<u8>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// Creates an empty builder targeting [`SCHEMA_VERSION`].
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tensors: Vec::new(),
            operators: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            buffers: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Overrides the schema version written to the header.
    pub fn set_schema_version(&mut self, version: u32) -> &mut Self {
        self.schema_version = version;
        self
    }

    /// Declares a tensor without constant data and returns its index.
    pub fn add_tensor(&mut self, shape: Shape, dtype: DType) -> u32 {
        self.push_tensor(shape, dtype, NO_BUFFER)
    }

    /// Declares a constant tensor backed by `bytes`.
    ///
    /// # Errors
    /// [`ModelError::InvalidTensor`] if `bytes` is not `shape × dtype` long.
    pub fn add_constant(
        &mut self,
        shape: Shape,
        dtype: DType,
        bytes: &[u8],
    ) -> Result<u32, ModelError> {
        if bytes.len() != shape.size_bytes(dtype) {
            return Err(ModelError::InvalidTensor {
                index: self.tensors.len(),
                reason: "constant data length does not match shape and dtype",
            });
        }

        // Keep every buffer 4-byte aligned within the data section.
        let padded = self.data.len().next_multiple_of(4);
        self.data.resize(padded, 0);
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(bytes);

        let buffer = self.buffers.len() as u32;
        self.buffers.push((offset, bytes.len() as u32));
        Ok(self.push_tensor(shape, dtype, buffer))
    }

    /// Declares an `F32` constant tensor. Values are stored little-endian.
    pub fn add_constant_f32(&mut self, shape: Shape, values: &[f32]) -> Result<u32, ModelError> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_constant(shape, DType::F32, &bytes)
    }

    /// Appends an operator and returns its node index.
    ///
    /// # Errors
    /// [`ModelError::InvalidOperator`] if more inputs or outputs are given
    /// than a record can hold.
    pub fn add_operator(
        &mut self,
        opcode: OpCode,
        inputs: &[u32],
        outputs: &[u32],
        params: OperatorParams,
    ) -> Result<u32, ModelError> {
        let node = self.operators.len();
        if inputs.len() > MAX_OPERATOR_INPUTS {
            return Err(ModelError::InvalidOperator {
                node,
                reason: "operator must have 1 to 3 inputs",
            });
        }
        if outputs.len() > MAX_OPERATOR_OUTPUTS {
            return Err(ModelError::InvalidOperator {
                node,
                reason: "operator must have 1 or 2 outputs",
            });
        }

        let mut entry = OperatorEntry {
            opcode,
            params,
            inputs: [0; MAX_OPERATOR_INPUTS],
            outputs: [0; MAX_OPERATOR_OUTPUTS],
            num_inputs: inputs.len() as u8,
            num_outputs: outputs.len() as u8,
        };
        entry.inputs[..inputs.len()].copy_from_slice(inputs);
        entry.outputs[..outputs.len()].copy_from_slice(outputs);
        self.operators.push(entry);
        Ok(node as u32)
    }

    /// Sets the graph input tensor indices.
    pub fn set_inputs(&mut self, tensors: &[u32]) -> &mut Self {
        self.inputs = tensors.to_vec();
        self
    }

    /// Sets the graph output tensor indices.
    pub fn set_outputs(&mut self, tensors: &[u32]) -> &mut Self {
        self.outputs = tensors.to_vec();
        self
    }

    /// Serializes the model.
    pub fn build(&self) -> Vec<u8> {
        let header = ModelHeader {
            schema_version: self.schema_version,
            num_tensors: self.tensors.len() as u32,
            num_operators: self.operators.len() as u32,
            num_inputs: self.inputs.len() as u32,
            num_outputs: self.outputs.len() as u32,
            num_buffers: self.buffers.len() as u32,
            data_len: self.data.len() as u32,
        };

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&header.to_bytes());

        for t in &self.tensors {
            out.push(t.dtype.code());
            out.push(t.shape.rank() as u8);
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&t.buffer.to_le_bytes());
            let mut dims = [0u32; MAX_RANK];
            for (slot, &d) in dims.iter_mut().zip(t.shape.dims()) {
                *slot = d as u32;
            }
            for d in dims {
                out.extend_from_slice(&d.to_le_bytes());
            }
        }

        for op in &self.operators {
            out.extend_from_slice(&[
                op.opcode.code(),
                op.params.activation.code(),
                op.num_inputs,
                op.num_outputs,
            ]);
            for idx in op.inputs.iter().chain(&op.outputs) {
                out.extend_from_slice(&idx.to_le_bytes());
            }
            out.extend_from_slice(&op.params.beta.to_le_bytes());
        }

        for idx in self.inputs.iter().chain(&self.outputs) {
            out.extend_from_slice(&idx.to_le_bytes());
        }
        for (offset, len) in &self.buffers {
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
        }
        out.extend_from_slice(&self.data);

        tracing::debug!(
            len = out.len(),
            tensors = self.tensors.len(),
            operators = self.operators.len(),
            "Model blob built"
        );
        out
    }

    fn encoded_len(&self) -> usize {
        use crate::format::{
            BUFFER_RECORD_LEN, HEADER_LEN, INDEX_LEN, OPERATOR_RECORD_LEN, TENSOR_RECORD_LEN,
        };
        HEADER_LEN
            + self.tensors.len() * TENSOR_RECORD_LEN
            + self.operators.len() * OPERATOR_RECORD_LEN
            + (self.inputs.len() + self.outputs.len()) * INDEX_LEN
            + self.buffers.len() * BUFFER_RECORD_LEN
            + self.data.len()
    }

    fn push_tensor(&mut self, shape: Shape, dtype: DType, buffer: u32) -> u32 {
        let index = self.tensors.len() as u32;
        self.tensors.push(TensorEntry {
            shape,
            dtype,
            buffer,
        });
        index
    }
}
