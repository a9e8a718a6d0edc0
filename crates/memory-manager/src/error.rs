// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for arena memory management.

/// Errors that can occur during arena allocation and access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The requested allocation does not fit in the remaining arena space.
    #[error("out of arena memory: requested {requested} bytes, but only {available} available (capacity: {capacity})")]
    OutOfArenaMemory {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    /// Attempted to allocate a zero-sized region.
    #[error("cannot allocate zero-sized region")]
    ZeroSizedAllocation,

    /// Alignment is not a power of two or exceeds the arena base alignment.
    #[error("invalid alignment {align}: must be a power of two no greater than {max}")]
    InvalidAlignment { align: usize, max: usize },

    /// A region handle points outside the allocated part of the arena.
    #[error("region [{offset}, {offset}+{len}) is outside the {used} allocated arena bytes")]
    RegionOutOfBounds {
        offset: usize,
        len: usize,
        used: usize,
    },

    /// Two regions requested for simultaneous access overlap and at least one is writable.
    #[error("regions at offsets {first} and {second} overlap")]
    OverlappingRegions { first: usize, second: usize },

    /// More regions were requested at once than the caller provided slots for.
    #[error("requested {requested} regions at once, but at most {max} are supported")]
    TooManyRegions { requested: usize, max: usize },

    /// An arena capacity string could not be parsed.
    #[error("invalid arena capacity '{0}': expected a number with an optional K/M/G suffix")]
    InvalidCapacity(String),
}
