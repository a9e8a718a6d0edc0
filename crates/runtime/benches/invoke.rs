// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for tensor allocation and invoke on the terrain model.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memory_manager::{AlignedBuffer, Arena};
use model_ir::{Model, SchemaPolicy};
use runtime::terrain::{run_classifier, terrain_model_blob, DEFAULT_ARENA_SIZE, TERRAIN_FEATURES};
use runtime::{Interpreter, OpResolver};

fn bench_allocate_tensors(c: &mut Criterion) {
    let blob = terrain_model_blob().unwrap();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();

    c.bench_function("allocate_tensors_terrain", |bench| {
        bench.iter(|| {
            let interpreter =
                Interpreter::new(black_box(model), &resolver, Arena::new(buffer.as_mut_slice()))
                    .allocate_tensors()
                    .unwrap();
            black_box(interpreter.arena_used())
        })
    });
}

fn bench_invoke(c: &mut Criterion) {
    let blob = terrain_model_blob().unwrap();
    let model = Model::from_bytes(&blob)
        .unwrap()
        .validate(SchemaPolicy::Strict)
        .unwrap();
    let resolver = OpResolver::with_all_ops();
    let mut buffer = AlignedBuffer::<DEFAULT_ARENA_SIZE>::new();
    let mut interpreter = Interpreter::new(model, &resolver, Arena::new(buffer.as_mut_slice()))
        .allocate_tensors()
        .unwrap();
    interpreter
        .input_mut(0)
        .unwrap()
        .copy_from_f32(&TERRAIN_FEATURES)
        .unwrap();

    c.bench_function("invoke_terrain", |bench| {
        bench.iter(|| interpreter.invoke().unwrap())
    });

    c.bench_function("run_classifier_terrain", |bench| {
        bench.iter(|| run_classifier(&mut interpreter, black_box(&TERRAIN_FEATURES)).unwrap())
    });
}

criterion_group!(benches, bench_allocate_tensors, bench_invoke);
criterion_main!(benches);
