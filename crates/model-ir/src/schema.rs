// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Schema-version compatibility policy.

use crate::{ModelError, SCHEMA_VERSION};
use std::fmt;

/// What to do when a blob's schema version differs from [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Reject the model with `SchemaVersionMismatch`.
    #[default]
    Strict,
    /// Log a warning, record a [`SchemaReport`], and continue.
    Warn,
}

impl SchemaPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for SchemaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "warn" | "warning" => Ok(Self::Warn),
            _ => Err(ModelError::UnknownSchemaPolicy(s.to_string())),
        }
    }
}

/// Outcome of comparing a blob's schema version with [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SchemaReport {
    pub found: u32,
    pub expected: u32,
}

impl SchemaReport {
    pub const fn new(found: u32) -> Self {
        Self {
            found,
            expected: SCHEMA_VERSION,
        }
    }

    /// Returns `true` when the versions agree.
    pub const fn is_match(&self) -> bool {
        self.found == self.expected
    }

    /// Applies `policy`: `Ok(None)` on a match, `Ok(Some(self))` for a
    /// tolerated mismatch, `Err` for a rejected one.
    pub fn enforce(self, policy: SchemaPolicy) -> Result<Option<Self>, ModelError> {
        if self.is_match() {
            return Ok(None);
        }
        match policy {
            SchemaPolicy::Strict => Err(ModelError::SchemaVersionMismatch {
                found: self.found,
                expected: self.expected,
            }),
            SchemaPolicy::Warn => {
                tracing::warn!(
                    found = self.found,
                    expected = self.expected,
                    "Model provided is schema version {} not equal to supported version {}",
                    self.found,
                    self.expected,
                );
                Ok(Some(self))
            }
        }
    }
}
