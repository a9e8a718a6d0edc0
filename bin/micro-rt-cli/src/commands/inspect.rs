// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt inspect` command: display model structure and arena needs.
//!
//! The blob is validated under the warn policy so that a schema mismatch
//! is reported instead of hiding the rest of the model.

use super::ModelSource;
use model_ir::{Model, ModelHeader, OpCode, OperatorParams, SchemaPolicy, SchemaReport, Validated};
use runtime::{OpResolver, TENSOR_ALIGNMENT};
use std::path::PathBuf;
use tensor_core::{DType, Shape};

#[derive(serde::Serialize)]
struct InspectReport {
    header: ModelHeader,
    schema: SchemaReport,
    tensors: Vec<TensorRow>,
    operators: Vec<OperatorRow>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    required_arena_bytes: usize,
    unsupported_operators: Vec<usize>,
}

#[derive(serde::Serialize)]
struct TensorRow {
    index: usize,
    shape: Shape,
    dtype: DType,
    bytes: usize,
    constant: bool,
}

#[derive(serde::Serialize)]
struct OperatorRow {
    node: usize,
    opcode: OpCode,
    params: OperatorParams,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
}

impl InspectReport {
    fn build(model: &Model<'_, Validated>) -> Self {
        let resolver = OpResolver::with_all_ops();
        let operators: Vec<OperatorRow> = model
            .operators()
            .enumerate()
            .map(|(node, op)| OperatorRow {
                node,
                opcode: op.opcode,
                params: op.params,
                inputs: op.inputs().to_vec(),
                outputs: op.outputs().to_vec(),
            })
            .collect();
        let unsupported_operators = operators
            .iter()
            .filter(|row| !resolver.is_registered(row.opcode))
            .map(|row| row.node)
            .collect();

        Self {
            header: *model.header(),
            schema: model.schema_report(),
            tensors: model
                .tensors()
                .enumerate()
                .map(|(index, meta)| TensorRow {
                    index,
                    shape: meta.shape,
                    dtype: meta.dtype,
                    bytes: meta.byte_size(),
                    constant: meta.is_constant(),
                })
                .collect(),
            operators,
            inputs: model.graph_inputs().collect(),
            outputs: model.graph_outputs().collect(),
            required_arena_bytes: model.required_arena_bytes(TENSOR_ALIGNMENT),
            unsupported_operators,
        }
    }
}

pub fn execute(model: PathBuf, json: bool) -> anyhow::Result<()> {
    let source = ModelSource::open(Some(&model))?;
    let validated = Model::from_bytes(&source)
        .and_then(|m| m.validate(SchemaPolicy::Warn))
        .map_err(|e| anyhow::anyhow!("failed to load model from '{}': {e}", model.display()))?;
    let report = InspectReport::build(&validated);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              micro-rt · Model Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Summary ────────────────────────────────────────────────
    println!("  File: {}", super::truncate(&source.describe(), 60));
    println!("  {}", validated.summary());
    if report.schema.is_match() {
        println!("  Schema: v{} (supported)", report.schema.found);
    } else {
        println!(
            "  Schema: v{} ⚠ supported version is v{}",
            report.schema.found, report.schema.expected
        );
    }
    println!("  Inputs:  {:?}", report.inputs);
    println!("  Outputs: {:?}", report.outputs);
    println!();

    // ── Tensors ────────────────────────────────────────────────
    println!(
        "  {:<4} {:<18} {:<6} {:>10} {:>8}",
        "Idx", "Shape", "DType", "Bytes", "Const",
    );
    println!("  {}", "-".repeat(50));
    for t in &report.tensors {
        println!(
            "  {:<4} {:<18} {:<6} {:>10} {:>8}",
            t.index,
            t.shape.to_string(),
            t.dtype.as_str(),
            t.bytes,
            if t.constant { "yes" } else { "" },
        );
    }
    println!();

    // ── Operators ──────────────────────────────────────────────
    println!(
        "  {:<4} {:<18} {:<10} {:<14} {:<10}",
        "Node", "Operator", "Activation", "Inputs", "Outputs",
    );
    println!("  {}", "-".repeat(60));
    for op in &report.operators {
        println!(
            "  {:<4} {:<18} {:<10} {:<14} {:<10}",
            op.node,
            op.opcode.as_str(),
            format!("{:?}", op.params.activation),
            format!("{:?}", op.inputs),
            format!("{:?}", op.outputs),
        );
    }
    println!();

    // ── Arena ──────────────────────────────────────────────────
    println!(
        "  Required arena: {} bytes ({TENSOR_ALIGNMENT}-byte aligned regions)",
        report.required_arena_bytes
    );
    if report.unsupported_operators.is_empty() {
        println!("  ✓ Every operator has a built-in kernel");
    } else {
        println!(
            "  ✗ No built-in kernel for node(s) {:?}",
            report.unsupported_operators
        );
    }

    Ok(())
}
