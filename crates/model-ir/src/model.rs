// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Zero-copy model reader and validation.
//!
//! # Type-State Pattern
//!
//! ```text
//! Model<Loaded>    : magic and section bounds checked, records untrusted.
//!       │  .validate(policy)
//!       ▼
//! Model<Validated> : records decoded, indices in range, graph acyclic
//!                     and single-assignment. Ready for an interpreter.
//! ```
//!
//! A `Model` never copies the blob. Records are decoded on access from the
//! borrowed bytes, and validation is a sequence of allocation-free scans.

use crate::format::{
    le_u32, ModelHeader, SectionLayout, BUFFER_RECORD_LEN, INDEX_LEN, MAX_OPERATOR_INPUTS,
    MAX_OPERATOR_OUTPUTS, NO_BUFFER, OPERATOR_RECORD_LEN, TENSOR_RECORD_LEN,
};
use crate::{ModelError, OpCode, OperatorParams, SchemaPolicy, SchemaReport};
use std::fmt;
use std::marker::PhantomData;
use tensor_core::{DType, FusedActivation, Shape, MAX_RANK};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: blob framing checked, records not yet validated.
#[derive(Debug, Clone, Copy)]
pub struct Loaded;

/// Marker: every record and the operator graph have been validated.
#[derive(Debug, Clone, Copy)]
pub struct Validated;

/// Sealed trait for model states.
pub trait ModelState: fmt::Debug + Clone + Copy {}
impl ModelState for Loaded {}
impl ModelState for Validated {}

// ── Decoded records ────────────────────────────────────────────────

/// Declared metadata of one tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TensorMeta {
    pub shape: Shape,
    pub dtype: DType,
    /// Index into the buffer table for constant tensors.
    pub buffer: Option<u32>,
}

impl TensorMeta {
    /// `shape × dtype` in bytes.
    pub fn byte_size(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }

    /// Returns `true` if the tensor carries constant data.
    pub fn is_constant(&self) -> bool {
        self.buffer.is_some()
    }
}

/// One operator in execution order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorNode {
    pub opcode: OpCode,
    pub params: OperatorParams,
    inputs: [u32; MAX_OPERATOR_INPUTS],
    outputs: [u32; MAX_OPERATOR_OUTPUTS],
    num_inputs: usize,
    num_outputs: usize,
}

impl OperatorNode {
    /// Tensor indices read by this operator.
    pub fn inputs(&self) -> &[u32] {
        &self.inputs[..self.num_inputs]
    }

    /// Tensor indices written by this operator.
    pub fn outputs(&self) -> &[u32] {
        &self.outputs[..self.num_outputs]
    }

    fn writes(&self, tensor: u32) -> bool {
        self.outputs().contains(&tensor)
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// A model blob viewed in place.
///
/// `'b` is the lifetime of the blob; `S` encodes the validation state.
#[derive(Clone, Copy)]
pub struct Model<'b, S: ModelState = Loaded> {
    bytes: &'b [u8],
    header: ModelHeader,
    layout: SectionLayout,
    _state: PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl<'b> Model<'b, Loaded> {
    /// Checks magic and section bounds and returns a `Loaded` model.
    ///
    /// Trailing bytes after the data section are ignored.
    ///
    /// # Errors
    /// [`ModelError::InvalidMagic`] or [`ModelError::Truncated`].
    pub fn from_bytes(bytes: &'b [u8]) -> Result<Self, ModelError> {
        let header = ModelHeader::parse(bytes)?;
        let layout = SectionLayout::compute(&header, bytes.len())?;

        tracing::debug!(
            schema_version = header.schema_version,
            tensors = header.num_tensors,
            operators = header.num_operators,
            len = bytes.len(),
            "Model blob framed"
        );

        Ok(Self {
            bytes,
            header,
            layout,
            _state: PhantomData,
        })
    }

    /// Validates every record and the operator graph, transitioning to the
    /// `Validated` state.
    ///
    /// # Checks
    /// - Schema version, under `policy`.
    /// - Tensors: known dtype, rank 1–4, non-zero dims, constant buffers in
    ///   range and exactly `byte_size` long.
    /// - Operators: arity within 1–3 inputs and 1–2 outputs, known fused
    ///   activation, every tensor index in range.
    /// - Graph: at least one input and output, all in range; no tensor is
    ///   written twice, and constants and graph inputs are never written;
    ///   every operator input is a constant, a graph input or the output of
    ///   an earlier operator; every graph output is produced.
    pub fn validate(self, policy: SchemaPolicy) -> Result<Model<'b, Validated>, ModelError> {
        self.schema_report().enforce(policy)?;

        let num_tensors = self.num_tensors();
        for index in 0..num_tensors {
            let meta = self.tensor(index)?;
            if let Some(buffer) = meta.buffer {
                let data = self.buffer(buffer as usize)?;
                if data.len() != meta.byte_size() {
                    return Err(ModelError::InvalidTensor {
                        index,
                        reason: "constant buffer length does not match shape and dtype",
                    });
                }
            }
        }

        if self.inputs_len() == 0 {
            return Err(ModelError::EmptyGraph("inputs"));
        }
        if self.outputs_len() == 0 {
            return Err(ModelError::EmptyGraph("outputs"));
        }
        for i in 0..self.inputs_len() {
            check_tensor_index("graph input", self.input_index(i)?, num_tensors)?;
        }
        for i in 0..self.outputs_len() {
            check_tensor_index("graph output", self.output_index(i)?, num_tensors)?;
        }

        for node in 0..self.num_operators() {
            let op = self.operator(node)?;
            for &t in op.inputs().iter().chain(op.outputs()) {
                check_tensor_index("operator tensor", t as usize, num_tensors)?;
            }
        }

        self.check_graph()?;

        tracing::info!(
            tensors = num_tensors,
            operators = self.num_operators(),
            inputs = self.inputs_len(),
            outputs = self.outputs_len(),
            "Model validated"
        );

        Ok(Model {
            bytes: self.bytes,
            header: self.header,
            layout: self.layout,
            _state: PhantomData,
        })
    }

    /// Single-assignment and ordering checks. Indices are already in range.
    fn check_graph(&self) -> Result<(), ModelError> {
        for node in 0..self.num_operators() {
            let op = self.operator(node)?;

            for (slot, &t) in op.outputs().iter().enumerate() {
                let tensor = t as usize;
                if self.tensor(tensor)?.is_constant() {
                    return Err(ModelError::InvalidGraph {
                        tensor,
                        reason: "operator writes a constant tensor",
                    });
                }
                if self.is_graph_input(t) {
                    return Err(ModelError::InvalidGraph {
                        tensor,
                        reason: "operator writes a graph input",
                    });
                }
                if op.outputs()[..slot].contains(&t) || self.produced_before(t, node) {
                    return Err(ModelError::InvalidGraph {
                        tensor,
                        reason: "tensor is written by more than one operator",
                    });
                }
            }

            for &t in op.inputs() {
                let tensor = t as usize;
                if op.writes(t) {
                    return Err(ModelError::InvalidGraph {
                        tensor,
                        reason: "operator reads its own output",
                    });
                }
                let available = self.tensor(tensor)?.is_constant()
                    || self.is_graph_input(t)
                    || self.produced_before(t, node);
                if !available {
                    return Err(ModelError::InvalidGraph {
                        tensor,
                        reason: "tensor is read before any operator produces it",
                    });
                }
            }
        }

        for i in 0..self.outputs_len() {
            let tensor = self.output_index(i)?;
            if !self.produced_before(tensor as u32, self.num_operators()) {
                return Err(ModelError::InvalidGraph {
                    tensor,
                    reason: "graph output is never produced",
                });
            }
        }

        Ok(())
    }

    fn is_graph_input(&self, tensor: u32) -> bool {
        (0..self.inputs_len()).any(|i| self.input_index(i).ok() == Some(tensor as usize))
    }

    /// Returns `true` if an operator before `node` writes `tensor`.
    fn produced_before(&self, tensor: u32, node: usize) -> bool {
        (0..node).any(|m| self.operator(m).map_or(false, |op| op.writes(tensor)))
    }
}

fn check_tensor_index(kind: &'static str, index: usize, count: usize) -> Result<(), ModelError> {
    if index >= count {
        return Err(ModelError::IndexOutOfRange { kind, index, count });
    }
    Ok(())
}

// ── Validated state ────────────────────────────────────────────────

impl<'b> Model<'b, Validated> {
    /// Iterates the declared tensors in index order.
    pub fn tensors(&self) -> impl Iterator<Item = TensorMeta> + '_ {
        (0..self.num_tensors()).filter_map(|i| self.tensor(i).ok())
    }

    /// Iterates the operators in execution order.
    pub fn operators(&self) -> impl Iterator<Item = OperatorNode> + '_ {
        (0..self.num_operators()).filter_map(|n| self.operator(n).ok())
    }

    /// Tensor indices of the graph inputs.
    pub fn graph_inputs(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.inputs_len()).filter_map(|i| self.input_index(i).ok())
    }

    /// Tensor indices of the graph outputs.
    pub fn graph_outputs(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.outputs_len()).filter_map(|i| self.output_index(i).ok())
    }

    /// Arena bytes needed to place every tensor in declaration order with
    /// each region aligned to `alignment`. Saturates at `usize::MAX`.
    pub fn required_arena_bytes(&self, alignment: usize) -> usize {
        let align = alignment.max(1);
        self.tensors()
            .try_fold(0usize, |offset, meta| {
                offset.checked_next_multiple_of(align)?.checked_add(meta.byte_size())
            })
            .unwrap_or(usize::MAX)
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<'b, S: ModelState> Model<'b, S> {
    /// Returns the decoded header.
    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// Returns the schema version stored in the blob.
    pub fn schema_version(&self) -> u32 {
        self.header.schema_version
    }

    /// Compares the blob's schema version with the supported one.
    pub fn schema_report(&self) -> SchemaReport {
        SchemaReport::new(self.header.schema_version)
    }

    /// Returns the underlying blob.
    pub fn as_bytes(&self) -> &'b [u8] {
        self.bytes
    }

    /// Length of the framed blob (header through data section).
    pub fn blob_len(&self) -> usize {
        self.layout.end
    }

    pub fn num_tensors(&self) -> usize {
        self.header.num_tensors as usize
    }

    pub fn num_operators(&self) -> usize {
        self.header.num_operators as usize
    }

    pub fn num_buffers(&self) -> usize {
        self.header.num_buffers as usize
    }

    /// Number of declared graph inputs.
    pub fn inputs_len(&self) -> usize {
        self.header.num_inputs as usize
    }

    /// Number of declared graph outputs.
    pub fn outputs_len(&self) -> usize {
        self.header.num_outputs as usize
    }

    /// Decodes tensor record `index`.
    pub fn tensor(&self, index: usize) -> Result<TensorMeta, ModelError> {
        let rec = self.record(
            "tensor",
            self.layout.tensors,
            TENSOR_RECORD_LEN,
            index,
            self.num_tensors(),
        )?;
        let invalid = |reason| ModelError::InvalidTensor { index, reason };

        let dtype = DType::from_code(rec[0]).ok_or(invalid("unknown dtype code"))?;
        let rank = rec[1] as usize;
        if rank == 0 || rank > MAX_RANK {
            return Err(invalid("rank must be between 1 and 4"));
        }

        let mut dims = [0usize; MAX_RANK];
        for (k, dim) in dims.iter_mut().enumerate() {
            let value = le_u32(rec, 8 + 4 * k) as usize;
            if k < rank && value == 0 {
                return Err(invalid("dimension is zero"));
            }
            if k >= rank && value != 0 {
                return Err(invalid("unused dimension is not zero"));
            }
            *dim = value;
        }
        let shape =
            Shape::new(&dims[..rank]).map_err(|_| invalid("rank must be between 1 and 4"))?;
        match shape.checked_size_bytes(dtype) {
            Some(bytes) if bytes <= isize::MAX as usize => {}
            _ => return Err(invalid("byte size overflows")),
        }

        let buffer = match le_u32(rec, 4) {
            NO_BUFFER => None,
            b => Some(b),
        };

        Ok(TensorMeta {
            shape,
            dtype,
            buffer,
        })
    }

    /// Decodes operator record `node`.
    pub fn operator(&self, node: usize) -> Result<OperatorNode, ModelError> {
        let rec = self.record(
            "operator",
            self.layout.operators,
            OPERATOR_RECORD_LEN,
            node,
            self.num_operators(),
        )?;
        let invalid = |reason| ModelError::InvalidOperator { node, reason };

        let opcode = OpCode::from_code(rec[0]);
        let activation =
            FusedActivation::from_code(rec[1]).ok_or(invalid("unknown fused activation code"))?;
        let num_inputs = rec[2] as usize;
        let num_outputs = rec[3] as usize;
        if !(1..=MAX_OPERATOR_INPUTS).contains(&num_inputs) {
            return Err(invalid("operator must have 1 to 3 inputs"));
        }
        if !(1..=MAX_OPERATOR_OUTPUTS).contains(&num_outputs) {
            return Err(invalid("operator must have 1 or 2 outputs"));
        }

        let mut inputs = [0u32; MAX_OPERATOR_INPUTS];
        for (k, slot) in inputs.iter_mut().enumerate() {
            *slot = le_u32(rec, 4 + 4 * k);
        }
        let mut outputs = [0u32; MAX_OPERATOR_OUTPUTS];
        for (k, slot) in outputs.iter_mut().enumerate() {
            *slot = le_u32(rec, 16 + 4 * k);
        }
        let beta = f32::from_bits(le_u32(rec, 24));

        Ok(OperatorNode {
            opcode,
            params: OperatorParams { activation, beta },
            inputs,
            outputs,
            num_inputs,
            num_outputs,
        })
    }

    /// Tensor index of the `i`-th graph input.
    pub fn input_index(&self, i: usize) -> Result<usize, ModelError> {
        let rec = self.record("graph input", self.layout.inputs, INDEX_LEN, i, self.inputs_len())?;
        Ok(le_u32(rec, 0) as usize)
    }

    /// Tensor index of the `i`-th graph output.
    pub fn output_index(&self, i: usize) -> Result<usize, ModelError> {
        let rec = self.record(
            "graph output",
            self.layout.outputs,
            INDEX_LEN,
            i,
            self.outputs_len(),
        )?;
        Ok(le_u32(rec, 0) as usize)
    }

    /// Returns the bytes of constant buffer `index`.
    pub fn buffer(&self, index: usize) -> Result<&'b [u8], ModelError> {
        let rec = self.record(
            "buffer",
            self.layout.buffers,
            BUFFER_RECORD_LEN,
            index,
            self.num_buffers(),
        )?;
        let offset = le_u32(rec, 0) as usize;
        let len = le_u32(rec, 4) as usize;
        let data = &self.bytes[self.layout.data..self.layout.end];
        offset
            .checked_add(len)
            .and_then(|end| data.get(offset..end))
            .ok_or(ModelError::InvalidBuffer {
                index,
                reason: "buffer extends past the data section",
            })
    }

    /// Returns the constant data of tensor `index`, if it has any.
    pub fn constant_data(&self, index: usize) -> Result<Option<&'b [u8]>, ModelError> {
        match self.tensor(index)?.buffer {
            Some(b) => self.buffer(b as usize).map(Some),
            None => Ok(None),
        }
    }

    /// Total bytes of constant data referenced by tensors.
    pub fn constant_bytes(&self) -> usize {
        (0..self.num_tensors())
            .filter_map(|i| self.tensor(i).ok())
            .filter(TensorMeta::is_constant)
            .map(|m| m.byte_size())
            .sum()
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model (schema v{}): {} tensors, {} operators, {} input(s), {} output(s), {} B constants",
            self.schema_version(),
            self.num_tensors(),
            self.num_operators(),
            self.inputs_len(),
            self.outputs_len(),
            self.constant_bytes(),
        )
    }

    fn record(
        &self,
        kind: &'static str,
        section: usize,
        record_len: usize,
        index: usize,
        count: usize,
    ) -> Result<&'b [u8], ModelError> {
        if index >= count {
            return Err(ModelError::IndexOutOfRange { kind, index, count });
        }
        let start = section + index * record_len;
        self.bytes
            .get(start..start + record_len)
            .ok_or(ModelError::Truncated {
                section: kind,
                needed: start + record_len,
                available: self.bytes.len(),
            })
    }
}

impl<S: ModelState> fmt::Debug for Model<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("state", &std::any::type_name::<S>())
            .field("header", &self.header)
            .field("blob_len", &self.layout.end)
            .finish()
    }
}

impl<S: ModelState> fmt::Display for Model<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for i in 0..self.num_tensors() {
            match self.tensor(i) {
                Ok(meta) => writeln!(
                    f,
                    "  tensor {i:>3}: {} {}{}",
                    meta.dtype,
                    meta.shape,
                    if meta.is_constant() { " (const)" } else { "" }
                )?,
                Err(e) => writeln!(f, "  tensor {i:>3}: <{e}>")?,
            }
        }
        for n in 0..self.num_operators() {
            match self.operator(n) {
                Ok(op) => writeln!(
                    f,
                    "  op {n:>3}: {} {:?} -> {:?}",
                    op.opcode,
                    op.inputs(),
                    op.outputs()
                )?,
                Err(e) => writeln!(f, "  op {n:>3}: <{e}>")?,
            }
        }
        Ok(())
    }
}
