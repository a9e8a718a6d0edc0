// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the helpers they share.

pub mod bench;
pub mod export_demo;
pub mod inspect;
pub mod run;

use anyhow::Context;
use model_ir::SchemaPolicy;
use runtime::terrain::{terrain_model_blob, NUM_FEATURES};
use runtime::RuntimeConfig;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` count picks the level.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads the config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(path) => {
            let config = RuntimeConfig::from_file(path)?;
            tracing::info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(RuntimeConfig::default()),
    }
}

/// Applies command-line flags on top of `config`.
pub fn override_config(
    mut config: RuntimeConfig,
    model: Option<PathBuf>,
    arena_size: Option<String>,
    schema_policy: Option<SchemaPolicy>,
) -> RuntimeConfig {
    if model.is_some() {
        config.model_path = model;
    }
    if let Some(size) = arena_size {
        config.arena_size = size;
    }
    if let Some(policy) = schema_policy {
        config.schema_policy = policy;
    }
    config
}

// ── Model source ───────────────────────────────────────────────────

/// Bytes of a model blob, either mapped from disk or built in memory.
pub enum ModelSource {
    Mapped { path: PathBuf, map: memmap2::Mmap },
    BuiltIn(Vec<u8>),
}

impl ModelSource {
    /// Maps `path` read-only, or builds the terrain demo model for `None`.
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::BuiltIn(terrain_model_blob()?));
        };
        let file = File::open(path)
            .with_context(|| format!("cannot open model '{}'", path.display()))?;
        // SAFETY: the mapping is read-only and the file is not modified
        // while the process holds it.
        let map = unsafe { memmap2::Mmap::map(&file) }
            .with_context(|| format!("cannot map model '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), len = map.len(), "Mapped model file");
        Ok(Self::Mapped {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Human-readable origin of the blob.
    pub fn describe(&self) -> String {
        match self {
            Self::Mapped { path, .. } => path.display().to_string(),
            Self::BuiltIn(_) => "built-in terrain model".to_string(),
        }
    }
}

impl Deref for ModelSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped { map, .. } => map,
            Self::BuiltIn(bytes) => bytes,
        }
    }
}

// ── Features ───────────────────────────────────────────────────────

/// Parses a feature window from text.
///
/// Accepts a JSON array, or floats separated by commas, whitespace or
/// newlines. Lines starting with `#` are skipped.
pub fn parse_features(text: &str) -> anyhow::Result<Vec<f32>> {
    let trimmed = text.trim();
    let values: Vec<f32> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("invalid JSON feature array")?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f32>()
                    .with_context(|| format!("invalid feature value '{tok}'"))
            })
            .collect::<anyhow::Result<_>>()?
    };

    anyhow::ensure!(
        values.len() == NUM_FEATURES,
        "expected {NUM_FEATURES} features, found {}",
        values.len()
    );
    Ok(values)
}

/// Reads and parses a feature file.
pub fn read_features(path: &Path) -> anyhow::Result<Vec<f32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read features '{}'", path.display()))?;
    parse_features(&text)
}

/// Allocates an arena buffer of `capacity` bytes plus alignment slack.
pub fn arena_buffer(capacity: usize) -> Vec<u8> {
    vec![0u8; capacity + runtime::TENSOR_ALIGNMENT]
}

/// Truncate a string to `max` characters, appending "…" if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
