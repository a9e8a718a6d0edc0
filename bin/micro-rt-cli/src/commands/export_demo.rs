// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt export-demo` command: write the built-in terrain model.

use anyhow::Context;
use model_ir::{Model, SchemaPolicy};
use runtime::terrain::terrain_model_blob;
use std::path::PathBuf;

pub fn execute(out: PathBuf) -> anyhow::Result<()> {
    let blob = terrain_model_blob()?;
    let model = Model::from_bytes(&blob)?.validate(SchemaPolicy::Strict)?;

    std::fs::write(&out, &blob)
        .with_context(|| format!("cannot write model to '{}'", out.display()))?;
    tracing::info!(path = %out.display(), bytes = blob.len(), "Exported terrain model");

    println!("  ✓ Wrote {} bytes to {}", blob.len(), out.display());
    println!("  {}", model.summary());
    Ok(())
}
