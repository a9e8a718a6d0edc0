// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt bench` command: time tensor allocation and invoke.

use super::{arena_buffer, ModelSource};
use memory_manager::Arena;
use model_ir::Model;
use runtime::terrain::TERRAIN_FEATURES;
use runtime::{InterpreterConfig, Interpreter, OpResolver, RuntimeConfig};
use std::time::{Duration, Instant};

/// Allocation cycles timed before the invoke loop.
const ALLOCATE_CYCLES: u32 = 100;

/// Latency samples summarised as min/mean/max.
#[derive(Debug, Default)]
struct Samples {
    min: Option<Duration>,
    max: Duration,
    total: Duration,
    count: u32,
}

impl Samples {
    fn record(&mut self, d: Duration) {
        self.min = Some(self.min.map_or(d, |m| m.min(d)));
        self.max = self.max.max(d);
        self.total += d;
        self.count += 1;
    }

    fn mean(&self) -> Duration {
        match self.count {
            0 => Duration::ZERO,
            n => self.total / n,
        }
    }

    fn row(&self, label: &str) -> String {
        let us = |d: Duration| d.as_secs_f64() * 1e6;
        format!(
            "{:<20} {:>8} {:>12.2} {:>12.2} {:>12.2}",
            label,
            self.count,
            us(self.min.unwrap_or_default()),
            us(self.mean()),
            us(self.max),
        )
    }
}

pub fn execute(config: RuntimeConfig, iterations: u32) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              micro-rt · Benchmark Suite              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let capacity = config.parse_arena_size()?;
    let source = ModelSource::open(config.model_path.as_deref())?;
    let model = Model::from_bytes(&source)?.validate(config.schema_policy)?;
    let resolver = OpResolver::with_all_ops();
    let mut buffer = arena_buffer(capacity.as_bytes());

    println!("  Model:      {}", super::truncate(&source.describe(), 50));
    println!("  Arena:      {capacity}");
    println!("  Iterations: {iterations}");
    println!();

    // ── allocate_tensors ───────────────────────────────────────
    let interpreter_config = InterpreterConfig::default().with_schema_policy(config.schema_policy);
    let mut created =
        Interpreter::with_config(model, &resolver, Arena::new(&mut buffer), interpreter_config);
    let mut allocate = Samples::default();
    for _ in 0..ALLOCATE_CYCLES {
        let start = Instant::now();
        let ready = created.allocate_tensors()?;
        allocate.record(start.elapsed());
        created = ready.reset();
    }

    // ── invoke ─────────────────────────────────────────────────
    let mut interpreter = created.allocate_tensors()?;
    if interpreter.inputs_len() > 0 && interpreter.input(0)?.num_elements() == TERRAIN_FEATURES.len() {
        interpreter.input_mut(0)?.copy_from_f32(&TERRAIN_FEATURES)?;
    }
    let mut invoke = Samples::default();
    for _ in 0..iterations {
        let start = Instant::now();
        interpreter.invoke()?;
        invoke.record(start.elapsed());
    }

    println!(
        "  {:<20} {:>8} {:>12} {:>12} {:>12}",
        "Phase", "Runs", "Min (µs)", "Mean (µs)", "Max (µs)",
    );
    println!("  {}", "-".repeat(68));
    println!("  {}", allocate.row("allocate_tensors"));
    println!("  {}", invoke.row("invoke"));
    println!();

    let mean = invoke.mean().as_secs_f64();
    if mean > 0.0 {
        println!("  Throughput: {:.0} inferences/s", 1.0 / mean);
    }
    println!(
        "  Arena: {} / {} bytes used",
        interpreter.arena_used(),
        interpreter.arena_capacity()
    );
    println!("  {}", interpreter.arena_stats().summary());

    Ok(())
}
