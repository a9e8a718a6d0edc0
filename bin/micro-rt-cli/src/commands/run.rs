// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt run` command: classify one feature window.
//!
//! Walks the full pipeline:
//! ```text
//! Model<Loaded> → validate → Interpreter<Created> → allocate_tensors → <Ready> → invoke
//! ```

use super::{arena_buffer, read_features, ModelSource};
use memory_manager::Arena;
use model_ir::Model;
use runtime::terrain::{
    classify, run_classifier, within_tolerance, DEFAULT_CONFIDENCE_THRESHOLD,
    EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE, TERRAIN_FEATURES,
};
use runtime::{Interpreter, OpResolver, RuntimeConfig};
use std::path::PathBuf;

pub fn execute(config: RuntimeConfig, features: Option<PathBuf>, repeat: u32) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            micro-rt · Inference Runner               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    anyhow::ensure!(repeat > 0, "--repeat must be at least 1");

    // ── Configuration ──────────────────────────────────────────
    let capacity = config.parse_arena_size()?;
    let source = ModelSource::open(config.model_path.as_deref())?;
    let window = match &features {
        Some(path) => read_features(path)?,
        None => TERRAIN_FEATURES.to_vec(),
    };

    println!("  Config:");
    println!("   Model:     {}", super::truncate(&source.describe(), 50));
    println!("   Arena:     {capacity}");
    println!("   Schema:    {}", config.schema_policy);
    println!(
        "   Features:  {}",
        features
            .as_ref()
            .map_or("reference terrain window".to_string(), |p| p.display().to_string())
    );
    println!("   Repeat:    {repeat}");
    println!();

    // ── Type-State Pipeline ────────────────────────────────────
    //
    // Step 1: frame and validate the blob.
    println!("  [1/3] Validating model...");
    let model = Model::from_bytes(&source)?.validate(config.schema_policy)?;
    println!("        {}", model.summary());
    println!();

    // Step 2: Created → Ready (place every tensor in the arena).
    println!("  [2/3] Allocating tensors...");
    let resolver = OpResolver::with_all_ops();
    let mut buffer = arena_buffer(capacity.as_bytes());
    let arena = Arena::new(&mut buffer);
    let mut interpreter =
        Interpreter::with_config(model, &resolver, arena, config.interpreter_config())
            .allocate_tensors()?;
    println!(
        "        Arena: {} / {} bytes used",
        interpreter.arena_used(),
        interpreter.arena_capacity()
    );
    if let Some(report) = interpreter.schema_report() {
        println!(
            "        ⚠ Schema version {} differs from supported {}",
            report.found, report.expected
        );
    }
    println!();

    // Step 3: invoke.
    println!("  [3/3] Invoking ({repeat} run(s))...");
    let mut probabilities = [0f32; runtime::terrain::NUM_CLASSES];
    for _ in 0..repeat {
        probabilities = run_classifier(&mut interpreter, &window)?;
    }
    println!();

    // ── Results ────────────────────────────────────────────────
    println!("  {:<12} {:>12}", "Class", "Probability");
    println!("  {}", "-".repeat(25));
    for (class, p) in probabilities.iter().enumerate() {
        println!("  {:<12} {:>12.6}", class, p);
    }
    println!();

    match classify(&probabilities, DEFAULT_CONFIDENCE_THRESHOLD) {
        Some(c) => println!(
            "  ✓ Class {} (confidence {:.3})",
            c.class, c.confidence
        ),
        None => println!(
            "  ✗ No class above confidence threshold {DEFAULT_CONFIDENCE_THRESHOLD}"
        ),
    }

    if features.is_none() {
        let ok = within_tolerance(&probabilities, &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE);
        println!(
            "  {} Reference output {} (tolerance {OUTPUT_TOLERANCE})",
            if ok { "✓" } else { "✗" },
            if ok { "matched" } else { "mismatched" }
        );
    }

    let metrics = interpreter.metrics();
    if metrics.enabled {
        println!();
        println!("  {:<6} {:<18} {:>12}", "Node", "Operator", "Mean (µs)");
        println!("  {}", "-".repeat(38));
        for op in &metrics.operators {
            println!(
                "  {:<6} {:<18} {:>12.2}",
                op.node,
                op.op,
                op.mean().as_secs_f64() * 1e6
            );
        }
        println!();
        println!("  {}", metrics.summary());
    }
    println!("  {}", interpreter.arena_stats().summary());

    Ok(())
}
