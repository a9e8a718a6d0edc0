// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use std::ops::{Deref, DerefMut};

/// A zeroed byte array aligned to [`crate::ARENA_BASE_ALIGNMENT`].
///
/// Backing an [`crate::Arena`] with this type means the arena skips no
/// prefix bytes, so its usable capacity is exactly `N`.
#[derive(Clone)]
#[repr(C, align(16))]
pub struct AlignedBuffer<const N: usize>([u8; N]);

impl<const N: usize> AlignedBuffer<N> {
    /// Creates a zero-filled buffer.
    pub const fn new() -> Self {
        Self([0u8; N])
    }

    /// Returns the buffer length `N`.
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` if `N == 0`.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl<const N: usize> Default for AlignedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for AlignedBuffer<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> DerefMut for AlignedBuffer<N> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl<const N: usize> std::fmt::Debug for AlignedBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer").field("len", &N).finish()
    }
}
