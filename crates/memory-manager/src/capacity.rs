// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena capacity configuration and parsing.
//!
//! An [`ArenaCapacity`] is the size of the tensor arena a caller should
//! reserve. It supports human-readable string parsing for CLI and config
//! ergonomics.

use crate::MemoryError;
use std::fmt;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// Size of a tensor arena in bytes.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"8K"` or `"8KB"` → 8 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"8192"` or `"8192B"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::ArenaCapacity;
///
/// let c = ArenaCapacity::parse("8K").unwrap();
/// assert_eq!(c.as_bytes(), 8192);
/// assert_eq!(c.to_string(), "8 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArenaCapacity {
    bytes: usize,
}

impl ArenaCapacity {
    /// Creates a capacity from a byte count.
    pub const fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a capacity from kibibytes.
    pub const fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KIB }
    }

    /// Returns the capacity in bytes.
    pub const fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Parses a human-readable capacity string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        let (num_str, multiplier) = [
            ("GB", GIB),
            ("G", GIB),
            ("MB", MIB),
            ("M", MIB),
            ("KB", KIB),
            ("K", KIB),
            ("B", 1),
        ]
        .iter()
        .find(|(suffix, _)| upper.ends_with(suffix))
        .map(|&(suffix, mult)| (&trimmed[..trimmed.len() - suffix.len()], mult))
        .unwrap_or((trimmed, 1));

        let invalid = || MemoryError::InvalidCapacity(s.to_string());

        let value: usize = num_str.trim().parse().map_err(|_| invalid())?;
        let bytes = value.checked_mul(multiplier).ok_or_else(invalid)?;
        if bytes == 0 {
            return Err(invalid());
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ArenaCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            b if b >= GIB && b % GIB == 0 => write!(f, "{} GB", b / GIB),
            b if b >= MIB && b % MIB == 0 => write!(f, "{} MB", b / MIB),
            b if b >= KIB && b % KIB == 0 => write!(f, "{} KB", b / KIB),
            b => write!(f, "{b} B"),
        }
    }
}

impl std::str::FromStr for ArenaCapacity {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(ArenaCapacity::parse("8K").unwrap().as_bytes(), 8192);
        assert_eq!(ArenaCapacity::parse("8KB").unwrap().as_bytes(), 8192);
        assert_eq!(ArenaCapacity::parse("8k").unwrap().as_bytes(), 8192);
        assert_eq!(ArenaCapacity::parse("8kb").unwrap().as_bytes(), 8192);
    }

    #[test]
    fn test_parse_larger_units() {
        assert_eq!(ArenaCapacity::parse("1M").unwrap().as_bytes(), MIB);
        assert_eq!(ArenaCapacity::parse("1GB").unwrap().as_bytes(), GIB);
    }

    #[test]
    fn test_parse_raw_bytes() {
        assert_eq!(ArenaCapacity::parse("8192").unwrap(), ArenaCapacity::from_kb(8));
        assert_eq!(ArenaCapacity::parse("100B").unwrap().as_bytes(), 100);
        assert_eq!(ArenaCapacity::parse("  512  ").unwrap().as_bytes(), 512);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ArenaCapacity::parse("").is_err());
        assert!(ArenaCapacity::parse("abc").is_err());
        assert!(ArenaCapacity::parse("0K").is_err());
        assert!(matches!(
            ArenaCapacity::parse("8Q"),
            Err(MemoryError::InvalidCapacity(s)) if s == "8Q"
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ArenaCapacity::from_kb(8).to_string(), "8 KB");
        assert_eq!(ArenaCapacity::from_bytes(MIB).to_string(), "1 MB");
        assert_eq!(ArenaCapacity::from_bytes(100).to_string(), "100 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = ArenaCapacity::from_kb(8);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "8192");
        let back: ArenaCapacity = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
