// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The graph interpreter with a type-state–enforced lifecycle.
//!
//! ```text
//! Interpreter<Created>
//!     │  .allocate_tensors()      ── Err ──▶ consumed; rebuild from scratch
//!     ▼
//! Interpreter<Ready> ◀─┐
//!     │  .invoke() ────┘
//!     │  .reset()
//!     ▼
//! Interpreter<Created>
//! ```
//!
//! Every tensor lives in the caller's arena. `allocate_tensors` places them
//! in declaration order and copies constant data in; `invoke` then walks the
//! operators without touching the heap.

use crate::{InterpreterConfig, InvokeMetrics, Kernel, OpResolver, RuntimeError};
use memory_manager::{Arena, ArenaRegion, ArenaStats, MemoryError};
use model_ir::format::{MAX_OPERATOR_INPUTS, MAX_OPERATOR_OUTPUTS};
use model_ir::{Model, ModelError, SchemaReport, TensorMeta, Validated};
use std::marker::PhantomData;
use std::time::Instant;
use tensor_core::{DType, Shape, TensorView, TensorViewMut};

/// Alignment of every tensor region, relative to the arena base.
pub const TENSOR_ALIGNMENT: usize = 16;

// ── Type-state markers ─────────────────────────────────────────────

/// Tensors are not yet placed in the arena.
#[derive(Debug)]
pub struct Created;

/// Tensors are placed and the interpreter can run.
#[derive(Debug)]
pub struct Ready;

/// Sealed trait for interpreter states.
pub trait InterpreterState: std::fmt::Debug {}
impl InterpreterState for Created {}
impl InterpreterState for Ready {}

// ── Bindings ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct TensorBinding {
    region: ArenaRegion,
    meta: TensorMeta,
}

impl TensorBinding {
    const EMPTY: Self = Self {
        region: ArenaRegion::empty(),
        meta: TensorMeta {
            shape: Shape::scalar(),
            dtype: DType::F32,
            buffer: None,
        },
    };
}

// ── Interpreter ────────────────────────────────────────────────────

/// Runs a validated model over a caller-supplied arena.
///
/// `'m` borrows the model blob and the resolver; `'a` borrows the arena
/// buffer. The interpreter owns the [`Arena`], so no other code can touch
/// tensor memory while it is alive.
///
/// # Example
/// ```
/// use memory_manager::{AlignedBuffer, Arena};
/// use model_ir::{Model, SchemaPolicy};
/// use runtime::terrain::{terrain_model_blob, DEFAULT_ARENA_SIZE, TERRAIN_FEATURES};
/// use runtime::{Interpreter, OpResolver};
///
/// let blob = terrain_model_blob()?;
/// let model = Model::from_bytes(&blob)?.validate(SchemaPolicy::Strict)?;
/// let resolver = OpResolver::with_all_ops();
/// let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
///
/// let mut interpreter =
///     Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice())).allocate_tensors()?;
/// interpreter.input_mut(0)?.copy_from_f32(&TERRAIN_FEATURES)?;
/// interpreter.invoke()?;
/// let probs = interpreter.output(0)?;
/// assert_eq!(probs.num_elements(), 4);
/// # Ok::<(), runtime::RuntimeError>(())
/// ```
pub struct Interpreter<'m, 'a, S: InterpreterState = Created> {
    model: Model<'m, Validated>,
    resolver: &'m OpResolver,
    arena: Arena<'a>,
    config: InterpreterConfig,
    kernels: Vec<&'static dyn Kernel>,
    bindings: Vec<TensorBinding>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    metrics: InvokeMetrics,
    schema_report: Option<SchemaReport>,
    _state: PhantomData<S>,
}

// ── Created → Ready ────────────────────────────────────────────────

impl<'m, 'a> Interpreter<'m, 'a, Created> {
    /// Creates an interpreter with the default configuration (strict schema
    /// policy, profiling off).
    pub fn new(model: Model<'m, Validated>, resolver: &'m OpResolver, arena: Arena<'a>) -> Self {
        Self::with_config(model, resolver, arena, InterpreterConfig::default())
    }

    /// Creates an interpreter with an explicit configuration.
    pub fn with_config(
        model: Model<'m, Validated>,
        resolver: &'m OpResolver,
        arena: Arena<'a>,
        config: InterpreterConfig,
    ) -> Self {
        tracing::debug!(
            operators = model.num_operators(),
            tensors = model.num_tensors(),
            arena_capacity = arena.capacity(),
            schema_policy = %config.schema_policy,
            "Interpreter created"
        );
        Self {
            model,
            resolver,
            arena,
            config,
            kernels: Vec::new(),
            bindings: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            metrics: InvokeMetrics::new(std::iter::empty(), config.enable_profiling),
            schema_report: None,
            _state: PhantomData,
        }
    }

    /// Places every tensor in the arena and resolves every kernel.
    /// Transitions to the `Ready` state.
    ///
    /// Steps:
    /// 1. Check the schema version under the configured policy. Nothing is
    ///    allocated before this passes.
    /// 2. Resolve a kernel for every operator.
    /// 3. Reset the arena and allocate each tensor in declaration order,
    ///    copying constant data into its region.
    ///
    /// # Errors
    /// [`RuntimeError::SchemaVersionMismatch`],
    /// [`RuntimeError::UnsupportedOperator`] or
    /// [`RuntimeError::OutOfArenaMemory`]. The interpreter is consumed.
    pub fn allocate_tensors(mut self) -> Result<Interpreter<'m, 'a, Ready>, RuntimeError> {
        let report = self
            .model
            .schema_report()
            .enforce(self.config.schema_policy)?;

        let num_operators = self.model.num_operators();
        self.kernels.clear();
        self.kernels.reserve(num_operators);
        for node in 0..num_operators {
            let op = self.model.operator(node)?;
            let kernel = self.resolver.resolve(op.opcode).map_err(|_| {
                tracing::error!(node, opcode = %op.opcode, "No kernel registered for operator");
                RuntimeError::UnsupportedOperator {
                    node: Some(node),
                    opcode: op.opcode,
                }
            })?;
            self.kernels.push(kernel);
        }

        self.arena.reset();
        let num_tensors = self.model.num_tensors();
        self.bindings.clear();
        self.bindings.reserve(num_tensors);
        for index in 0..num_tensors {
            let meta = self.model.tensor(index)?;
            let region = self
                .arena
                .allocate(meta.byte_size(), TENSOR_ALIGNMENT)
                .map_err(|source| allocation_error(index, source))?;
            if let Some(data) = self.model.constant_data(index)? {
                let dst = self.arena.bytes_mut(region)?;
                if dst.len() != data.len() {
                    return Err(RuntimeError::InvalidModel(ModelError::InvalidTensor {
                        index,
                        reason: "constant buffer length does not match shape and dtype",
                    }));
                }
                dst.copy_from_slice(data);
            }
            self.bindings.push(TensorBinding { region, meta });
        }

        self.inputs = (0..self.model.inputs_len())
            .map(|i| self.model.input_index(i))
            .collect::<Result<_, _>>()?;
        self.outputs = (0..self.model.outputs_len())
            .map(|i| self.model.output_index(i))
            .collect::<Result<_, _>>()?;
        self.metrics = InvokeMetrics::new(
            self.kernels.iter().map(|k| k.name()),
            self.config.enable_profiling,
        );
        self.schema_report = report;

        tracing::info!(
            tensors = num_tensors,
            operators = num_operators,
            arena_used = self.arena.used(),
            arena_capacity = self.arena.capacity(),
            "Tensors allocated"
        );

        Ok(self.transition())
    }
}

// ── Ready: accessors and invoke ────────────────────────────────────

impl<'m, 'a> Interpreter<'m, 'a, Ready> {
    /// Number of graph inputs.
    pub fn inputs_len(&self) -> usize {
        self.inputs.len()
    }

    /// Number of graph outputs.
    pub fn outputs_len(&self) -> usize {
        self.outputs.len()
    }

    /// The view bound to the `i`-th graph input.
    pub fn input(&self, i: usize) -> Result<TensorView<'_>, RuntimeError> {
        let t = graph_tensor("input", &self.inputs, i)?;
        self.tensor(t)
    }

    /// The writable view bound to the `i`-th graph input.
    pub fn input_mut(&mut self, i: usize) -> Result<TensorViewMut<'_>, RuntimeError> {
        let t = graph_tensor("input", &self.inputs, i)?;
        let b = binding(&self.bindings, t)?;
        let bytes = self.arena.bytes_mut(b.region)?;
        Ok(TensorViewMut::new(b.meta.shape, b.meta.dtype, bytes)?)
    }

    /// The view bound to the `i`-th graph output.
    pub fn output(&self, i: usize) -> Result<TensorView<'_>, RuntimeError> {
        let t = graph_tensor("output", &self.outputs, i)?;
        self.tensor(t)
    }

    /// The view bound to declared tensor `index`.
    pub fn tensor(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        let b = binding(&self.bindings, index)?;
        let bytes = self.arena.bytes(b.region)?;
        Ok(TensorView::new(b.meta.shape, b.meta.dtype, bytes)?)
    }

    /// Arena region bound to declared tensor `index`.
    pub fn tensor_region(&self, index: usize) -> Result<ArenaRegion, RuntimeError> {
        binding(&self.bindings, index).map(|b| b.region)
    }

    /// Runs every operator once, in declaration order.
    ///
    /// # Errors
    /// [`RuntimeError::OperatorExecutionError`] from the first failing
    /// kernel. Output contents are undefined after a failure.
    pub fn invoke(&mut self) -> Result<(), RuntimeError> {
        let profiling = self.config.enable_profiling;
        let started = profiling.then(Instant::now);

        for (node, &kernel) in self.kernels.iter().enumerate() {
            let op = self.model.operator(node)?;
            let (ins, outs) = (op.inputs(), op.outputs());

            let mut in_bind = [TensorBinding::EMPTY; MAX_OPERATOR_INPUTS];
            let mut out_bind = [TensorBinding::EMPTY; MAX_OPERATOR_OUTPUTS];
            for (slot, &t) in in_bind.iter_mut().zip(ins) {
                *slot = binding(&self.bindings, t as usize)?;
            }
            for (slot, &t) in out_bind.iter_mut().zip(outs) {
                *slot = binding(&self.bindings, t as usize)?;
            }
            let reads = in_bind.map(|b| b.region);
            let writes = out_bind.map(|b| b.region);

            let mut read_bytes: [&[u8]; MAX_OPERATOR_INPUTS] = [&[]; MAX_OPERATOR_INPUTS];
            let mut write_bytes: [&mut [u8]; MAX_OPERATOR_OUTPUTS] = Default::default();
            self.arena.split_disjoint(
                &reads[..ins.len()],
                &writes[..outs.len()],
                &mut read_bytes,
                &mut write_bytes,
            )?;

            let mut in_views = [TensorView::empty(); MAX_OPERATOR_INPUTS];
            for ((view, b), bytes) in in_views.iter_mut().zip(&in_bind).zip(read_bytes).take(ins.len()) {
                *view = TensorView::new(b.meta.shape, b.meta.dtype, bytes)?;
            }
            let mut out_views: [TensorViewMut<'_>; MAX_OPERATOR_OUTPUTS] =
                std::array::from_fn(|_| TensorViewMut::empty());
            for ((view, b), bytes) in out_views.iter_mut().zip(&out_bind).zip(write_bytes).take(outs.len()) {
                *view = TensorViewMut::new(b.meta.shape, b.meta.dtype, bytes)?;
            }

            let op_started = profiling.then(Instant::now);
            kernel
                .execute(&in_views[..ins.len()], &mut out_views[..outs.len()], &op.params)
                .map_err(|source| {
                    tracing::error!(node, op = kernel.name(), error = %source, "Operator failed");
                    RuntimeError::OperatorExecutionError {
                        node,
                        op: kernel.name(),
                        source,
                    }
                })?;
            if let Some(t) = op_started {
                self.metrics.record_operator(node, t.elapsed());
            }
            tracing::debug!(node, op = kernel.name(), "Operator executed");
        }

        self.metrics
            .finish_invoke(started.map(|t| t.elapsed()).unwrap_or_default());
        Ok(())
    }

    /// Number of successful invocations since allocation.
    pub fn invocations(&self) -> u64 {
        self.metrics.invocations
    }

    /// Profiling metrics. Durations stay zero when profiling is disabled.
    pub fn metrics(&self) -> &InvokeMetrics {
        &self.metrics
    }

    /// Releases every tensor and returns to the `Created` state.
    pub fn reset(mut self) -> Interpreter<'m, 'a, Created> {
        self.arena.reset();
        self.kernels.clear();
        self.bindings.clear();
        self.inputs.clear();
        self.outputs.clear();
        self.metrics.clear();
        self.schema_report = None;
        tracing::debug!("Interpreter reset");
        self.transition()
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<'m, 'a, S: InterpreterState> Interpreter<'m, 'a, S> {
    /// The model being run.
    pub fn model(&self) -> &Model<'m, Validated> {
        &self.model
    }

    /// The active configuration.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// The schema mismatch tolerated under the warn policy, if any.
    pub fn schema_report(&self) -> Option<SchemaReport> {
        self.schema_report
    }

    /// Arena bytes in use, including alignment padding.
    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    /// Usable arena capacity in bytes.
    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Snapshot of arena allocation statistics.
    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    fn transition<T: InterpreterState>(self) -> Interpreter<'m, 'a, T> {
        Interpreter {
            model: self.model,
            resolver: self.resolver,
            arena: self.arena,
            config: self.config,
            kernels: self.kernels,
            bindings: self.bindings,
            inputs: self.inputs,
            outputs: self.outputs,
            metrics: self.metrics,
            schema_report: self.schema_report,
            _state: PhantomData,
        }
    }
}

impl<S: InterpreterState> std::fmt::Debug for Interpreter<'_, '_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("state", &std::any::type_name::<S>())
            .field("model", &self.model)
            .field("config", &self.config)
            .field("arena_used", &self.arena.used())
            .field("arena_capacity", &self.arena.capacity())
            .field("invocations", &self.metrics.invocations)
            .finish()
    }
}

fn graph_tensor(kind: &'static str, list: &[usize], i: usize) -> Result<usize, RuntimeError> {
    list.get(i).copied().ok_or_else(|| out_of_range(kind, i, list.len()))
}

fn binding(bindings: &[TensorBinding], index: usize) -> Result<TensorBinding, RuntimeError> {
    bindings
        .get(index)
        .copied()
        .ok_or_else(|| out_of_range("tensor", index, bindings.len()))
}

fn out_of_range(kind: &'static str, index: usize, count: usize) -> RuntimeError {
    tracing::error!(kind, index, count, "Tensor index out of range");
    RuntimeError::IndexOutOfRange { kind, index, count }
}

/// Only a capacity failure is reported as running out of arena memory.
fn allocation_error(tensor: usize, source: MemoryError) -> RuntimeError {
    tracing::error!(tensor, error = %source, "Failed to allocate tensor");
    match source {
        MemoryError::OutOfArenaMemory { .. } => RuntimeError::OutOfArenaMemory { tensor, source },
        other => RuntimeError::MemoryError(other),
    }
}
