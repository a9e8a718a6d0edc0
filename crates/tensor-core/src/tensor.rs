// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Borrowed tensor views over arena memory.
//!
//! Tensors never own their storage. A view pairs a [`Shape`] and a [`DType`]
//! with a byte slice that normally lives in the caller's arena, and the
//! borrow checker ties the view to that buffer.

use crate::{DType, Shape, TensorError};

/// A read-only, typed view over a region of bytes.
///
/// # Memory Layout
/// Data is stored in row-major (C) order. Typed access is provided via
/// [`as_f32`](TensorView::as_f32), which fails rather than panics when the
/// dtype or alignment is wrong.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: Shape,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Creates a view, checking that `data` is exactly `shape × dtype` bytes.
    pub fn new(shape: Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        let expected = shape
            .checked_size_bytes(dtype)
            .ok_or(TensorError::SizeOverflow { shape })?;
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Creates an `F32` view over a slice of floats.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Shape, TensorView};
    /// let values = [1.0f32, 2.0, 3.0];
    /// let v = TensorView::from_f32(Shape::vector(3), &values).unwrap();
    /// assert_eq!(v.as_f32().unwrap(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &'a [f32]) -> Result<Self, TensorError> {
        Self::new(shape, DType::F32, bytemuck::cast_slice(values))
    }

    /// An empty placeholder view. Never handed to a kernel.
    pub const fn empty() -> Self {
        Self {
            shape: Shape::scalar(),
            dtype: DType::F32,
            data: &[],
        }
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the size of the view in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Interprets the view as a slice of `f32`.
    ///
    /// # Errors
    /// [`TensorError::UnsupportedDType`] if the view is not `F32`,
    /// [`TensorError::Misaligned`] if the bytes are not 4-byte aligned.
    pub fn as_f32(&self) -> Result<&'a [f32], TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "as_f32",
                dtype: self.dtype,
            });
        }
        bytemuck::try_cast_slice(self.data).map_err(|_| TensorError::Misaligned {
            op: "as_f32",
            align: std::mem::align_of::<f32>(),
        })
    }
}

/// A writable, typed view over a region of bytes.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    shape: Shape,
    dtype: DType,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Creates a writable view, checking that `data` is exactly `shape × dtype` bytes.
    pub fn new(shape: Shape, dtype: DType, data: &'a mut [u8]) -> Result<Self, TensorError> {
        let expected = shape
            .checked_size_bytes(dtype)
            .ok_or(TensorError::SizeOverflow { shape })?;
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Creates a writable `F32` view over a slice of floats.
    pub fn from_f32(shape: Shape, values: &'a mut [f32]) -> Result<Self, TensorError> {
        Self::new(shape, DType::F32, bytemuck::cast_slice_mut(values))
    }

    /// An empty placeholder view. Never handed to a kernel.
    pub fn empty() -> Self {
        Self {
            shape: Shape::scalar(),
            dtype: DType::F32,
            data: &mut [],
        }
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the size of the view in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    /// Returns the raw byte slice mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape,
            dtype: self.dtype,
            data: self.data,
        }
    }

    /// Interprets the view as a slice of `f32`.
    pub fn as_f32(&self) -> Result<&[f32], TensorError> {
        self.check_f32("as_f32")?;
        bytemuck::try_cast_slice(self.data).map_err(|_| TensorError::Misaligned {
            op: "as_f32",
            align: std::mem::align_of::<f32>(),
        })
    }

    /// Interprets the view as a mutable slice of `f32`.
    pub fn as_f32_mut(&mut self) -> Result<&mut [f32], TensorError> {
        self.check_f32("as_f32_mut")?;
        bytemuck::try_cast_slice_mut(self.data).map_err(|_| TensorError::Misaligned {
            op: "as_f32_mut",
            align: std::mem::align_of::<f32>(),
        })
    }

    /// Copies `values` into the tensor. The element count must match.
    pub fn copy_from_f32(&mut self, values: &[f32]) -> Result<(), TensorError> {
        let dst = self.as_f32_mut()?;
        if dst.len() != values.len() {
            return Err(TensorError::BufferSizeMismatch {
                expected: dst.len() * DType::F32.size_bytes(),
                actual: values.len() * DType::F32.size_bytes(),
            });
        }
        dst.copy_from_slice(values);
        Ok(())
    }

    /// Fills the tensor with a constant `f32` value.
    pub fn fill_f32(&mut self, value: f32) -> Result<(), TensorError> {
        self.as_f32_mut()?.iter_mut().for_each(|x| *x = value);
        Ok(())
    }

    fn check_f32(&self, op: &'static str) -> Result<(), TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op,
                dtype: self.dtype,
            });
        }
        Ok(())
    }
}
