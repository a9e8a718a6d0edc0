// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bump arena over a caller-owned byte buffer.
//!
//! The [`Arena`] is the only allocator the runtime uses for tensor storage.
//! It:
//!
//! 1. Hands out aligned, zero-filled, non-overlapping regions by bumping an
//!    offset. Individual regions are never freed.
//! 2. Fails with `OutOfArenaMemory` when a request does not fit. It never
//!    truncates or grows.
//! 3. Aligns its own base to [`ARENA_BASE_ALIGNMENT`], so region offsets
//!    (and every usage total) are the same for any buffer address.
//! 4. Tracks [`ArenaStats`] for sizing the buffer.
//!
//! # Thread Safety
//! `Arena<'a>` holds the buffer's unique `&'a mut [u8]`. It is `Send` but
//! not shared; two allocators over one buffer cannot coexist.

use crate::{ArenaStats, MemoryError};

/// Alignment of the arena's usable base. Also the largest alignment
/// [`Arena::allocate`] accepts.
pub const ARENA_BASE_ALIGNMENT: usize = 16;

/// Maximum number of writable regions [`Arena::split_disjoint`] can hand out
/// in one call.
pub const MAX_DISJOINT_WRITES: usize = 4;

/// A handle to an allocated byte range, relative to the arena's aligned base.
///
/// Regions carry no borrow. They are only meaningful for the arena that
/// issued them, and only until that arena is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ArenaRegion {
    offset: usize,
    len: usize,
}

impl ArenaRegion {
    /// A zero-length region at offset 0, used as a placeholder.
    pub const fn empty() -> Self {
        Self { offset: 0, len: 0 }
    }

    /// Byte offset from the arena base.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length region. The arena never issues one.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Returns `true` if the two ranges share at least one byte.
    pub const fn overlaps(&self, other: &ArenaRegion) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    fn contains(&self, other: &ArenaRegion) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }
}

/// Bump allocator over a borrowed byte buffer.
///
/// # Example
/// ```
/// use memory_manager::{AlignedBuffer, Arena, MemoryError};
///
/// let mut backing = AlignedBuffer::<64>::new();
/// let mut arena = Arena::new(backing.as_mut_slice());
///
/// let r = arena.allocate(40, 4).unwrap();
/// arena.bytes_mut(r).unwrap()[0] = 7;
/// assert_eq!(arena.bytes(r).unwrap()[0], 7);
///
/// let err = arena.allocate(32, 16).unwrap_err();
/// assert!(matches!(err, MemoryError::OutOfArenaMemory { requested: 32, .. }));
/// ```
pub struct Arena<'a> {
    buf: &'a mut [u8],
    base: usize,
    offset: usize,
    stats: ArenaStats,
}

impl<'a> Arena<'a> {
    /// Creates an arena over `buf`.
    ///
    /// If `buf` does not start on an [`ARENA_BASE_ALIGNMENT`] boundary, the
    /// leading bytes up to the next boundary are skipped and reported by
    /// [`base_padding`](Arena::base_padding).
    pub fn new(buf: &'a mut [u8]) -> Self {
        let misalignment = buf.as_ptr() as usize % ARENA_BASE_ALIGNMENT;
        let base = ((ARENA_BASE_ALIGNMENT - misalignment) % ARENA_BASE_ALIGNMENT).min(buf.len());
        tracing::debug!(
            len = buf.len(),
            base_padding = base,
            "Arena created"
        );
        Self {
            buf,
            base,
            offset: 0,
            stats: ArenaStats::default(),
        }
    }

    /// Allocates `size` zero-filled bytes aligned to `align` (relative to
    /// the aligned base).
    ///
    /// # Errors
    /// - [`MemoryError::ZeroSizedAllocation`] if `size == 0`.
    /// - [`MemoryError::InvalidAlignment`] if `align` is not a power of two
    ///   or exceeds [`ARENA_BASE_ALIGNMENT`].
    /// - [`MemoryError::OutOfArenaMemory`] if the request does not fit.
    ///   The arena is left unchanged.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<ArenaRegion, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        if !align.is_power_of_two() || align > ARENA_BASE_ALIGNMENT {
            return Err(MemoryError::InvalidAlignment {
                align,
                max: ARENA_BASE_ALIGNMENT,
            });
        }

        let capacity = self.capacity();
        let start = self.offset.next_multiple_of(align);
        let end = match start.checked_add(size) {
            Some(end) if end <= capacity => end,
            _ => {
                self.stats.record_failure();
                tracing::debug!(
                    requested = size,
                    available = self.remaining(),
                    capacity,
                    "Arena allocation failed"
                );
                return Err(MemoryError::OutOfArenaMemory {
                    requested: size,
                    available: self.remaining(),
                    capacity,
                });
            }
        };

        let padding = start - self.offset;
        self.buf[self.base + start..self.base + end].fill(0);
        self.offset = end;
        self.stats.record_allocation(size, padding, end);

        tracing::trace!(offset = start, size, padding, "Arena allocation");
        Ok(ArenaRegion { offset: start, len: size })
    }

    /// Empties the arena. Every region issued so far becomes invalid.
    pub fn reset(&mut self) {
        tracing::debug!(used = self.offset, "Arena reset");
        self.offset = 0;
        self.stats.record_reset();
    }

    /// Usable capacity in bytes (buffer length minus base padding).
    pub fn capacity(&self) -> usize {
        self.buf.len() - self.base
    }

    /// Bytes currently allocated, including alignment padding.
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Bytes skipped at the front of the buffer to align the base.
    pub fn base_padding(&self) -> usize {
        self.base
    }

    /// Peak value of [`used`](Arena::used) since creation.
    pub fn high_water_mark(&self) -> usize {
        self.stats.high_water_mark
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> ArenaStats {
        self.stats.clone()
    }

    /// Borrows the bytes of an allocated region.
    pub fn bytes(&self, region: ArenaRegion) -> Result<&[u8], MemoryError> {
        self.check_bounds(region)?;
        Ok(&self.buf[self.base + region.offset..self.base + region.end()])
    }

    /// Mutably borrows the bytes of an allocated region.
    pub fn bytes_mut(&mut self, region: ArenaRegion) -> Result<&mut [u8], MemoryError> {
        self.check_bounds(region)?;
        let base = self.base;
        Ok(&mut self.buf[base + region.offset..base + region.end()])
    }

    /// Borrows several regions at once: `reads` shared, `writes` exclusive.
    ///
    /// Slices are written to `read_out[i]` / `write_out[i]` in the order the
    /// regions were given. Read regions may overlap each other; a write
    /// region may overlap nothing else in the request.
    ///
    /// # Errors
    /// - [`MemoryError::TooManyRegions`] if more than
    ///   [`MAX_DISJOINT_WRITES`] writes are requested, or an output slice
    ///   is shorter than its request list.
    /// - [`MemoryError::RegionOutOfBounds`] for a region past `used()`.
    /// - [`MemoryError::OverlappingRegions`] if a write overlaps another
    ///   requested region.
    pub fn split_disjoint<'s>(
        &'s mut self,
        reads: &[ArenaRegion],
        writes: &[ArenaRegion],
        read_out: &mut [&'s [u8]],
        write_out: &mut [&'s mut [u8]],
    ) -> Result<(), MemoryError> {
        let max_writes = MAX_DISJOINT_WRITES.min(write_out.len());
        if writes.len() > max_writes {
            return Err(MemoryError::TooManyRegions {
                requested: writes.len(),
                max: max_writes,
            });
        }
        if reads.len() > read_out.len() {
            return Err(MemoryError::TooManyRegions {
                requested: reads.len(),
                max: read_out.len(),
            });
        }
        for &region in reads.iter().chain(writes) {
            self.check_bounds(region)?;
        }

        // Sort write indices by offset; there are at most MAX_DISJOINT_WRITES.
        let mut order = [0usize; MAX_DISJOINT_WRITES];
        for (i, slot) in order.iter_mut().enumerate().take(writes.len()) {
            *slot = i;
        }
        let order = &mut order[..writes.len()];
        order.sort_unstable_by_key(|&i| writes[i].offset);

        for pair in order.windows(2) {
            let (a, b) = (writes[pair[0]], writes[pair[1]]);
            if a.overlaps(&b) {
                return Err(MemoryError::OverlappingRegions {
                    first: a.offset,
                    second: b.offset,
                });
            }
        }
        for read in reads {
            if let Some(w) = writes.iter().find(|w| w.overlaps(read)) {
                return Err(MemoryError::OverlappingRegions {
                    first: read.offset,
                    second: w.offset,
                });
            }
        }

        // Carve the allocated bytes into gap, write, gap, write, ..., gap.
        let (base, used) = (self.base, self.offset);
        let mut rest: &'s mut [u8] = &mut self.buf[base..base + used];
        let mut cursor = 0usize;
        let mut gaps: [(usize, &'s [u8]); MAX_DISJOINT_WRITES + 1] =
            [(0, &[]); MAX_DISJOINT_WRITES + 1];

        for (k, &idx) in order.iter().enumerate() {
            let region = writes[idx];
            let tail = std::mem::take(&mut rest);
            let (gap, tail) = tail.split_at_mut(region.offset - cursor);
            let (slice, tail) = tail.split_at_mut(region.len);
            gaps[k] = (cursor, &*gap);
            write_out[idx] = slice;
            cursor = region.end();
            rest = tail;
        }
        gaps[order.len()] = (cursor, &*rest);

        for (read, out) in reads.iter().zip(read_out.iter_mut()) {
            let gap = gaps[..=order.len()].iter().find(|(start, bytes)| {
                ArenaRegion {
                    offset: *start,
                    len: bytes.len(),
                }
                .contains(read)
            });
            // A read that overlaps no write lies inside exactly one gap.
            let Some(&(start, bytes)) = gap else {
                return Err(MemoryError::OverlappingRegions {
                    first: read.offset,
                    second: read.offset,
                });
            };
            *out = &bytes[read.offset - start..read.end() - start];
        }

        Ok(())
    }

    fn check_bounds(&self, region: ArenaRegion) -> Result<(), MemoryError> {
        if region.is_empty() || region.end() > self.offset {
            return Err(MemoryError::RegionOutOfBounds {
                offset: region.offset,
                len: region.len,
                used: self.offset,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.offset)
            .field("base_padding", &self.base)
            .field("high_water_mark", &self.stats.high_water_mark)
            .finish()
    }
}
