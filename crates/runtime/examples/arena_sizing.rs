// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Find the smallest arena that fits the terrain classifier.
//!
//! Tries a range of arena sizes against the built-in demo model, reports
//! which ones allocate, then classifies the reference feature vector with
//! profiling enabled.
//!
//! ```bash
//! cargo run -p runtime --example arena_sizing
//! ```

use memory_manager::{Arena, ArenaCapacity};
use model_ir::{Model, SchemaPolicy};
use runtime::terrain::{
    classify, run_classifier, terrain_model_blob, DEFAULT_ARENA_SIZE,
    DEFAULT_CONFIDENCE_THRESHOLD, TERRAIN_FEATURES,
};
use runtime::{Interpreter, InterpreterConfig, OpResolver, TENSOR_ALIGNMENT};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing.
    tracing_subscriber::fmt().with_env_filter("info").init();

    let blob = terrain_model_blob()?;
    let model = Model::from_bytes(&blob)?.validate(SchemaPolicy::Strict)?;
    let resolver = OpResolver::with_all_ops();
    println!("Model: {}", model.summary());
    println!(
        "Required: {} bytes at {}-byte alignment\n",
        model.required_arena_bytes(TENSOR_ALIGNMENT),
        TENSOR_ALIGNMENT
    );

    println!("{:<10} {:>10} {:>10}  {}", "Arena", "Used", "Free", "Result");
    println!("{}", "-".repeat(48));

    for kb in [1usize, 2, 3, 4, 8] {
        let capacity = ArenaCapacity::from_kb(kb);
        let mut buffer = vec![0u8; capacity.as_bytes() + TENSOR_ALIGNMENT];
        let arena = Arena::new(&mut buffer);
        match Interpreter::new(model, &resolver, arena).allocate_tensors() {
            Ok(interpreter) => println!(
                "{:<10} {:>10} {:>10}  ok",
                capacity.to_string(),
                interpreter.arena_used(),
                interpreter.arena_capacity() - interpreter.arena_used(),
            ),
            Err(e) => println!("{:<10} {:>10} {:>10}  FAIL: {e}", capacity.to_string(), "-", "-"),
        }
    }

    println!("\n--- Classifying the reference window @ {} bytes ---\n", DEFAULT_ARENA_SIZE);
    let mut buffer = vec![0u8; DEFAULT_ARENA_SIZE + TENSOR_ALIGNMENT];
    let mut interpreter = Interpreter::with_config(
        model,
        &resolver,
        Arena::new(&mut buffer),
        InterpreterConfig::profiled(),
    )
    .allocate_tensors()?;

    let probs = run_classifier(&mut interpreter, &TERRAIN_FEATURES)?;
    println!("Probabilities: {probs:?}");
    match classify(&probs, DEFAULT_CONFIDENCE_THRESHOLD) {
        Some(c) => println!("Class: {} ({:.3})", c.class, c.confidence),
        None => println!("Class: below threshold"),
    }
    println!("Metrics: {}", interpreter.metrics().summary());
    println!("Arena: {}", interpreter.arena_stats().summary());

    Ok(())
}
