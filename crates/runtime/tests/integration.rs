// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end terrain classification.
//!
//! These tests exercise the complete flow from blob → validation →
//! arena allocation → invoke, proving that the four library crates compose
//! correctly and that the type-state transitions work end-to-end.

use memory_manager::{AlignedBuffer, Arena, MemoryError};
use model_ir::{Model, ModelBuilder, OpCode, OperatorParams, SchemaPolicy, SCHEMA_VERSION};
use runtime::terrain::{
    classify, run_classifier, terrain_model_blob, within_tolerance, DEFAULT_ARENA_SIZE,
    DEFAULT_CONFIDENCE_THRESHOLD, EXPECTED_TERRAIN_OUTPUT, NUM_CLASSES, OUTPUT_TOLERANCE,
    TERRAIN_FEATURES,
};
use runtime::{
    ContractViolation, Interpreter, InterpreterConfig, OpResolver, RuntimeConfig, RuntimeError,
    TENSOR_ALIGNMENT, TERRAIN_INPUT, TERRAIN_OUTPUT,
};
use tensor_core::{DType, Shape};

// ── Helpers ────────────────────────────────────────────────────────

fn terrain_blob() -> Vec<u8> {
    terrain_model_blob().unwrap()
}

/// Rewrites the schema version field of an encoded blob.
fn with_schema_version(mut blob: Vec<u8>, version: u32) -> Vec<u8> {
    blob[4..8].copy_from_slice(&version.to_le_bytes());
    blob
}

// ── End to end ─────────────────────────────────────────────────────

#[test]
fn test_terrain_end_to_end() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();

    let mut interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    let input = interpreter.input(0).unwrap();
    assert_eq!(input.shape().rank(), 2);
    assert_eq!(input.shape().dims(), &[1, 48]);
    assert_eq!(input.dtype(), DType::F32);

    interpreter
        .input_mut(0)
        .unwrap()
        .copy_from_f32(&TERRAIN_FEATURES)
        .unwrap();
    interpreter.invoke().unwrap();

    let output = interpreter.output(0).unwrap();
    assert_eq!(output.shape().dims(), &[1, NUM_CLASSES]);
    assert_eq!(output.dtype(), DType::F32);
    let probs = output.as_f32().unwrap();
    for (p, e) in probs.iter().zip(EXPECTED_TERRAIN_OUTPUT) {
        assert!((p - e).abs() <= OUTPUT_TOLERANCE, "got {probs:?}");
    }

    let decision = classify(probs, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
    assert_eq!(decision.class, 3);
}

#[test]
fn test_run_classifier_helper() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let mut interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    let probs = run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap();
    assert!(within_tolerance(&probs, &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE));
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);

    assert!(matches!(
        run_classifier(&mut interpreter, &TERRAIN_FEATURES[..47]),
        Err(RuntimeError::TensorError(_))
    ));
}

#[test]
fn test_declared_metadata_matches_views() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    for (i, t) in model.graph_inputs().enumerate() {
        let meta = model.tensor(t).unwrap();
        let view = interpreter.input(i).unwrap();
        assert_eq!(*view.shape(), meta.shape);
        assert_eq!(view.dtype(), meta.dtype);
        assert_eq!(TERRAIN_INPUT.check(&view), Ok(()));
    }
    for (i, t) in model.graph_outputs().enumerate() {
        let meta = model.tensor(t).unwrap();
        let view = interpreter.output(i).unwrap();
        assert_eq!(*view.shape(), meta.shape);
        assert_eq!(view.dtype(), meta.dtype);
        assert_eq!(TERRAIN_OUTPUT.check(&view), Ok(()));
    }
    assert_eq!(
        interpreter.arena_used(),
        model.required_arena_bytes(TENSOR_ALIGNMENT)
    );
}

#[test]
fn test_repeated_invokes_are_bit_identical() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let mut interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    let first = run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap();
    for _ in 0..5 {
        let again = run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap();
        assert_eq!(again.map(f32::to_bits), first.map(f32::to_bits));
    }
    assert_eq!(interpreter.invocations(), 6);
}

#[test]
fn test_allocation_is_deterministic_across_passes() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();

    let mut a = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let mut b = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let first = Interpreter::new(model, &resolver, Arena::new(a.as_mut_slice()))
        .allocate_tensors()
        .unwrap();
    let second = Interpreter::new(model, &resolver, Arena::new(b.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    assert_eq!(first.arena_used(), second.arena_used());
    for t in 0..model.num_tensors() {
        assert_eq!(
            first.tensor_region(t).unwrap(),
            second.tensor_region(t).unwrap()
        );
    }
}

// ── Failure paths ──────────────────────────────────────────────────

#[test]
fn test_output_index_out_of_range() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();

    assert_eq!(interpreter.outputs_len(), 1);
    assert_eq!(
        interpreter.output(4).unwrap_err(),
        RuntimeError::IndexOutOfRange {
            kind: "output",
            index: 4,
            count: 1
        }
    );
}

#[test]
fn test_undersized_arena_fails() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<2048>::new();

    for _ in 0..2 {
        let err = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
            .allocate_tensors()
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::OutOfArenaMemory {
                tensor: 1,
                source: MemoryError::OutOfArenaMemory { requested: 3072, .. }
            }
        ));
    }
}

#[test]
fn test_overflowing_tensor_never_reaches_the_arena() {
    // 2^62 + 1 f32 elements: the byte size wraps on 64-bit targets.
    let mut b = ModelBuilder::new();
    let x = b.add_tensor(Shape::new(&[27905, 8681, 49477, 384773]).unwrap(), DType::F32);
    let y = b.add_tensor(Shape::matrix(1, 1), DType::F32);
    b.add_operator(OpCode::Relu, &[x], &[y], OperatorParams::default())
        .unwrap();
    b.set_inputs(&[x]).set_outputs(&[y]);
    let blob = b.build();

    let err: RuntimeError = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap_err()
        .into();
    assert_eq!(
        err,
        RuntimeError::InvalidModel(model_ir::ModelError::InvalidTensor {
            index: 0,
            reason: "byte size overflows",
        })
    );
}

#[test]
fn test_strict_schema_mismatch_at_validation() {
    let blob = with_schema_version(terrain_blob(), SCHEMA_VERSION + 1);
    let err: RuntimeError = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap_err()
        .into();
    assert_eq!(
        err,
        RuntimeError::SchemaVersionMismatch {
            found: SCHEMA_VERSION + 1,
            expected: SCHEMA_VERSION
        }
    );
}

#[test]
fn test_strict_interpreter_leaves_arena_untouched() {
    let blob = with_schema_version(terrain_blob(), SCHEMA_VERSION - 1);
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Warn)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    buffer.as_mut_slice().fill(0xAA);

    let err = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap_err();
    assert!(matches!(err, RuntimeError::SchemaVersionMismatch { .. }));
    assert!(buffer.as_slice().iter().all(|&b| b == 0xAA));
}

#[test]
fn test_warn_policy_runs_and_reports() {
    let blob = with_schema_version(terrain_blob(), SCHEMA_VERSION + 7);
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Warn)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let config = RuntimeConfig {
        schema_policy: SchemaPolicy::Warn,
        ..Default::default()
    }
    .interpreter_config();

    let mut interpreter =
        Interpreter::with_config(model, &resolver, Arena::new(buffer.as_mut_slice()), config)
            .allocate_tensors()
            .unwrap();
    let report = interpreter.schema_report().unwrap();
    assert_eq!(report.found, SCHEMA_VERSION + 7);
    assert_eq!(report.expected, SCHEMA_VERSION);

    let probs = run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap();
    assert!(within_tolerance(&probs, &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE));
}

#[test]
fn test_unknown_opcode_is_unsupported() {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor(Shape::matrix(1, 4), DType::F32);
    let h = b.add_tensor(Shape::matrix(1, 4), DType::F32);
    let y = b.add_tensor(Shape::matrix(1, 4), DType::F32);
    b.add_operator(OpCode::Relu, &[x], &[h], OperatorParams::default())
        .unwrap();
    b.add_operator(OpCode::Unknown(42), &[h], &[y], OperatorParams::default())
        .unwrap();
    b.set_inputs(&[x]).set_outputs(&[y]);
    let blob = b.build();

    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<256>::new();
    let err = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap_err();
    assert_eq!(
        err,
        RuntimeError::UnsupportedOperator {
            node: Some(1),
            opcode: OpCode::Unknown(42)
        }
    );
}

#[test]
fn test_contract_rejects_wrong_model() {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor(Shape::matrix(1, 8), DType::F32);
    let y = b.add_tensor(Shape::matrix(1, 8), DType::F32);
    b.add_operator(OpCode::Softmax, &[x], &[y], OperatorParams::softmax(1.0))
        .unwrap();
    b.set_inputs(&[x]).set_outputs(&[y]);
    let blob = b.build();

    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<256>::new();
    let mut interpreter = Interpreter::with_config(
        model,
        &resolver,
        Arena::new(buffer.as_mut_slice()),
        InterpreterConfig::profiled(),
    )
    .allocate_tensors()
    .unwrap();

    let err = run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ContractViolation(ContractViolation::Dims { .. })
    ));
    assert_eq!(interpreter.invocations(), 0);
}

#[test]
fn test_profiling_covers_every_operator() {
    let blob = terrain_blob();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let mut interpreter = Interpreter::with_config(
        model,
        &resolver,
        Arena::new(buffer.as_mut_slice()),
        InterpreterConfig::profiled(),
    )
    .allocate_tensors()
    .unwrap();

    run_classifier(&mut interpreter, &TERRAIN_FEATURES).unwrap();
    let m = interpreter.metrics();
    let ops: Vec<_> = m.operators.iter().map(|s| s.op).collect();
    assert_eq!(ops, ["fully_connected", "fully_connected", "softmax"]);
    assert!(m.operators.iter().all(|s| s.calls == 1));
    assert!(m.summary().contains("3 operators"));
}
