// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # micro-rt
//!
//! Command-line interface for the micro-inference-rt interpreter.
//!
//! ## Usage
//! ```bash
//! # Classify the reference window with the built-in terrain model
//! micro-rt run
//!
//! # Run a model blob on features from a file, in a 4 KB arena
//! micro-rt run --model terrain.mirt --features window.csv --arena-size 4K
//!
//! # Inspect a model blob
//! micro-rt inspect --model terrain.mirt --json
//!
//! # Time invoke
//! micro-rt bench --iterations 10000
//!
//! # Write the built-in terrain model to disk
//! micro-rt export-demo --out terrain.mirt
//! ```

mod commands;

use clap::{Parser, Subcommand};
use model_ir::SchemaPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "micro-rt",
    about = "Arena-backed model interpreter for microcontroller-class targets",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file. Explicit flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one feature window.
    Run {
        /// Path to a model blob. Defaults to the built-in terrain model.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Feature file: a JSON array or comma/whitespace separated floats.
        /// Defaults to the reference terrain window.
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Tensor arena size (e.g., "8K", "8192").
        #[arg(short, long)]
        arena_size: Option<String>,

        /// Schema version policy: strict or warn.
        #[arg(short, long)]
        schema_policy: Option<SchemaPolicy>,

        /// Number of invocations.
        #[arg(short, long, default_value_t = 1)]
        repeat: u32,
    },

    /// Inspect a model blob: header, tensors, operators and arena needs.
    Inspect {
        /// Path to the model blob.
        #[arg(short, long)]
        model: PathBuf,

        /// Print machine-readable JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Time allocate_tensors and invoke.
    Bench {
        /// Path to a model blob. Defaults to the built-in terrain model.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Number of timed invocations.
        #[arg(short, long, default_value_t = 1000)]
        iterations: u32,

        /// Tensor arena size (e.g., "8K").
        #[arg(short, long)]
        arena_size: Option<String>,
    },

    /// Write the built-in terrain model blob to a file.
    ExportDemo {
        /// Output path.
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            model,
            features,
            arena_size,
            schema_policy,
            repeat,
        } => {
            let config = commands::override_config(config, model, arena_size, schema_policy);
            commands::run::execute(config, features, repeat)
        }
        Commands::Inspect { model, json } => commands::inspect::execute(model, json),
        Commands::Bench {
            model,
            iterations,
            arena_size,
        } => {
            let config = commands::override_config(config, model, arena_size, None);
            commands::bench::execute(config, iterations)
        }
        Commands::ExportDemo { out } => commands::export_demo::execute(out),
    }
}
