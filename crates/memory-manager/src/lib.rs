// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! A bump arena allocator over a caller-supplied byte buffer. Every tensor
//! the runtime touches lives in one fixed region that the caller owns,
//! typically a `static` array on targets without a heap.
//!
//! # Key Components
//!
//! - [`Arena`]: the allocator: hands out aligned, zero-filled, disjoint
//!   [`ArenaRegion`]s and fails (never truncates) when the buffer is full.
//! - [`ArenaCapacity`]: human-readable capacity parsing (`"8K"`, `"1M"`).
//! - [`ArenaStats`]: cumulative allocator metrics (requests, padding,
//!   failures, high-water mark).
//! - [`AlignedBuffer`]: a 16-byte aligned byte array for static arenas.
//!
//! # Ownership Model
//!
//! ```text
//!   caller buffer (&'a mut [u8])
//!       │
//!       ▼
//!   Arena<'a>  ── allocate(size, align) ──► ArenaRegion { offset, len }
//!       │
//!       │  bytes(region) / bytes_mut(region) / split_disjoint(..)
//!       ▼
//!   &[u8] / &mut [u8] borrowed from the arena
//! ```
//!
//! Regions are plain offset handles, so they carry no borrow. Access goes
//! back through the arena, which lets the borrow checker guarantee that a
//! writable slice is never aliased. `reset()` invalidates every region
//! issued before it.
//!
//! # Example
//! ```
//! use memory_manager::{AlignedBuffer, Arena};
//!
//! let mut backing = AlignedBuffer::<1024>::new();
//! let mut arena = Arena::new(backing.as_mut_slice());
//!
//! let a = arena.allocate(192, 16).unwrap();
//! let b = arena.allocate(16, 16).unwrap();
//! assert_eq!(a.offset(), 0);
//! assert_eq!(b.offset(), 192);
//! assert_eq!(arena.used(), 208);
//!
//! arena.reset();
//! assert_eq!(arena.used(), 0);
//! ```

mod aligned;
pub mod arena;
mod capacity;
mod error;
mod stats;

pub use aligned::AlignedBuffer;
pub use arena::{Arena, ArenaRegion, ARENA_BASE_ALIGNMENT, MAX_DISJOINT_WRITES};
pub use capacity::ArenaCapacity;
pub use error::MemoryError;
pub use stats::ArenaStats;
