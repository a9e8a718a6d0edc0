// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/terrain.mirt"
//! arena_size = "8K"
//! schema_policy = "strict"
//! enable_profiling = true
//! ```

use memory_manager::ArenaCapacity;
use model_ir::SchemaPolicy;
use std::path::{Path, PathBuf};

use crate::terrain::DEFAULT_ARENA_SIZE;

/// Configuration for a deployment of the interpreter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Path to a model blob. `None` selects the built-in terrain model.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Tensor arena capacity (human-readable, e.g., `"8K"`).
    #[serde(default = "default_arena_size")]
    pub arena_size: String,
    /// How to treat a schema version mismatch.
    #[serde(default)]
    pub schema_policy: SchemaPolicy,
    /// Whether to record per-operator timings.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_true() -> bool {
    true
}

fn default_arena_size() -> String {
    format!("{}K", DEFAULT_ARENA_SIZE / 1024)
}

/// The subset of configuration the interpreter consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpreterConfig {
    pub schema_policy: SchemaPolicy,
    pub enable_profiling: bool,
}

impl InterpreterConfig {
    /// Strict schema checking, profiling on.
    pub fn profiled() -> Self {
        Self {
            schema_policy: SchemaPolicy::Strict,
            enable_profiling: true,
        }
    }

    /// Returns a copy with `policy`.
    pub fn with_schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::RuntimeError::ConfigError(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::RuntimeError> {
        toml::from_str(toml_str).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML parse error: {e}"))
        })
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::RuntimeError> {
        toml::to_string_pretty(self).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML serialise error: {e}"))
        })
    }

    /// Parses the arena size string into an [`ArenaCapacity`].
    pub fn parse_arena_size(&self) -> Result<ArenaCapacity, super::RuntimeError> {
        ArenaCapacity::parse(&self.arena_size)
            .map_err(|e| super::RuntimeError::ConfigError(format!("invalid arena size: {e}")))
    }

    /// Returns the settings the interpreter consumes.
    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig {
            schema_policy: self.schema_policy,
            enable_profiling: self.enable_profiling,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            arena_size: default_arena_size(),
            schema_policy: SchemaPolicy::Strict,
            enable_profiling: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = RuntimeConfig::default();
        assert_eq!(c.arena_size, "8K");
        assert_eq!(c.schema_policy, SchemaPolicy::Strict);
        assert!(c.model_path.is_none());
        assert!(c.enable_profiling);
    }

    #[test]
    fn test_parse_arena_size() {
        let c = RuntimeConfig {
            arena_size: "16KB".into(),
            ..Default::default()
        };
        assert_eq!(c.parse_arena_size().unwrap().as_bytes(), 16 * 1024);
    }

    #[test]
    fn test_parse_arena_size_invalid() {
        let c = RuntimeConfig {
            arena_size: "lots".into(),
            ..Default::default()
        };
        assert!(matches!(
            c.parse_arena_size(),
            Err(crate::RuntimeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
model_path = "/tmp/terrain.mirt"
arena_size = "4K"
schema_policy = "warn"
enable_profiling = false
"#;
        let c = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(c.model_path, Some(PathBuf::from("/tmp/terrain.mirt")));
        assert_eq!(c.arena_size, "4K");
        assert_eq!(c.schema_policy, SchemaPolicy::Warn);
        assert!(!c.enable_profiling);
    }

    #[test]
    fn test_from_toml_defaults() {
        let c = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(c, RuntimeConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_bad_policy() {
        let err = RuntimeConfig::from_toml("schema_policy = \"lenient\"").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RuntimeConfig {
            model_path: Some(PathBuf::from("model.mirt")),
            schema_policy: SchemaPolicy::Warn,
            ..Default::default()
        };
        let toml = c.to_toml().unwrap();
        let back = RuntimeConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_interpreter_config() {
        let c = RuntimeConfig {
            schema_policy: SchemaPolicy::Warn,
            enable_profiling: false,
            ..Default::default()
        };
        let ic = c.interpreter_config();
        assert_eq!(ic.schema_policy, SchemaPolicy::Warn);
        assert!(!ic.enable_profiling);
        assert_eq!(
            InterpreterConfig::default().with_schema_policy(SchemaPolicy::Warn),
            InterpreterConfig {
                schema_policy: SchemaPolicy::Warn,
                enable_profiling: false
            }
        );
    }
}
