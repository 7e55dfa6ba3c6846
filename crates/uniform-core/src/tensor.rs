//! Typed, shaped tensors over host byte storage
//!
//! A [`Tensor`] pairs a [`DataType`] and a row-major shape with a
//! [`HostBuffer`] whose length is exactly `numel * element_size`. The
//! invariant is checked once at construction; nothing downstream
//! re-validates it.
//!
//! # Examples
//!
//! ```
//! use uniform_core::{DataType, Tensor};
//!
//! // Owned, zero-filled
//! let t = Tensor::create(DataType::Float32, &[2, 3])?;
//! assert_eq!(t.size_bytes(), 24);
//!
//! // Aliasing a stack array holding one scalar
//! let raw = 1.0f32.to_ne_bytes();
//! let high = Tensor::from_buffer(DataType::Float32, &[1], &raw, false)?;
//! assert!(!high.is_owned());
//! # Ok::<(), uniform_core::Error>(())
//! ```

use crate::buffer::{HostBuffer, MemoryPool};
use crate::dtype::{with_element_type, DataType, Element};
use crate::error::{Error, Result};
use std::fmt;

/// Elements shown on each side of the elision in `Display`
const DISPLAY_EDGE_ITEMS: usize = 16;

/// Multi-dimensional tensor with an element type tag
///
/// `'a` is the lifetime of caller memory aliased by the tensor; tensors that
/// own their storage are `Tensor<'static>`.
#[derive(Clone)]
pub struct Tensor<'a> {
    /// Element type
    dtype: DataType,
    /// Tensor shape (dimensions)
    shape: Vec<usize>,
    /// Underlying storage
    buffer: HostBuffer<'a>,
    /// Where the storage lives
    pool: MemoryPool,
}

/// Number of bytes needed for `shape` elements of `dtype`
pub fn byte_size(dtype: DataType, shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .and_then(|numel| numel.checked_mul(dtype.element_size()))
        .ok_or_else(|| Error::SizeOverflow {
            shape: shape.to_vec(),
            dtype,
        })
}

impl Tensor<'static> {
    /// Allocate a zero-filled tensor
    ///
    /// # Errors
    ///
    /// [`Error::SizeOverflow`] if the byte size does not fit in `usize`,
    /// [`Error::OutOfMemory`] if the storage cannot be reserved.
    #[tracing::instrument(fields(dtype = %dtype, shape = ?shape))]
    pub fn create(dtype: DataType, shape: &[usize]) -> Result<Self> {
        let size = byte_size(dtype, shape)?;
        let buffer = HostBuffer::zeroed(size)?;
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            buffer,
            pool: MemoryPool::CpuOnly,
        })
    }

    /// Build an owned tensor from typed host data
    ///
    /// The element type is taken from `T`.
    pub fn from_vec<T: Element>(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let expected = byte_size(T::DTYPE, shape)?;
        let actual = std::mem::size_of_val(data.as_slice());
        if expected != actual {
            return Err(Error::BufferSizeMismatch { expected, actual });
        }

        Ok(Self {
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            buffer: HostBuffer::copied(bytemuck::cast_slice(&data))?,
            pool: MemoryPool::CpuOnly,
        })
    }
}

impl<'a> Tensor<'a> {
    /// Build a tensor over caller-supplied bytes
    ///
    /// With `copy == true` the bytes are copied into owned storage. With
    /// `copy == false` the tensor aliases `buffer` and cannot outlive it.
    ///
    /// # Errors
    ///
    /// [`Error::BufferSizeMismatch`] if `buffer.len()` differs from
    /// `product(shape) * element_size(dtype)`.
    #[tracing::instrument(skip(buffer), fields(dtype = %dtype, shape = ?shape, bytes = buffer.len()))]
    pub fn from_buffer(dtype: DataType, shape: &[usize], buffer: &'a [u8], copy: bool) -> Result<Self> {
        let expected = byte_size(dtype, shape)?;
        if buffer.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }

        let buffer = if copy {
            HostBuffer::copied(buffer)?
        } else {
            HostBuffer::borrowed(buffer)
        };

        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            buffer,
            pool: MemoryPool::CpuOnly,
        })
    }

    /// Get element type
    pub fn datatype(&self) -> DataType {
        self.dtype
    }

    /// Get tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get number of dimensions
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get total size in bytes
    pub fn size_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Get memory pool
    pub fn pool(&self) -> MemoryPool {
        self.pool
    }

    /// Whether the tensor owns its storage
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    /// Raw element bytes (native endian, row-major)
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Mutable raw bytes; detaches aliased storage first
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.make_mut()
    }

    /// Copy elements out as `T`
    ///
    /// `Bool` tensors read as `u8`.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if `T` does not match the tensor's type.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let storage_type = match self.dtype {
            DataType::Bool => DataType::UInt8,
            other => other,
        };
        if storage_type != T::DTYPE {
            return Err(Error::TypeMismatch {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        Ok(bytemuck::pod_collect_to_vec(self.as_bytes()))
    }

    /// All elements widened to `f64`
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_element_type!(self.dtype, T => {
            self.as_bytes()
                .chunks_exact(std::mem::size_of::<T>())
                .map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk).to_f64())
                .collect()
        })
    }

    /// Element at flat `index` widened to `f64`
    pub fn element_f64(&self, index: usize) -> Option<f64> {
        let size = self.dtype.element_size();
        let start = index.checked_mul(size)?;
        let chunk = self.as_bytes().get(start..start.checked_add(size)?)?;
        Some(with_element_type!(self.dtype, T => bytemuck::pod_read_unaligned::<T>(chunk).to_f64()))
    }

    /// The single element of a one-element tensor, widened to `f64`
    ///
    /// `None` unless `numel() == 1`, whatever the rank.
    pub fn scalar_f64(&self) -> Option<f64> {
        if self.numel() != 1 {
            return None;
        }
        self.element_f64(0)
    }

    /// Detach from caller memory, copying if aliased
    pub fn into_owned(self) -> Tensor<'static> {
        Tensor {
            dtype: self.dtype,
            shape: self.shape,
            buffer: self.buffer.into_owned(),
            pool: self.pool,
        }
    }
}

impl fmt::Debug for Tensor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("pool", &self.pool)
            .field("owned", &self.is_owned())
            .finish()
    }
}

/// Human-readable dump: type, shape, then values (long tensors elided)
impl fmt::Display for Tensor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor<{}>{:?} [", self.dtype, self.shape)?;
        let values = self.to_f64_vec();
        let elide = values.len() > 2 * DISPLAY_EDGE_ITEMS;
        for (i, value) in values.iter().enumerate() {
            if elide && i >= DISPLAY_EDGE_ITEMS && i < values.len() - DISPLAY_EDGE_ITEMS {
                if i == DISPLAY_EDGE_ITEMS {
                    write!(f, ", ...")?;
                }
                continue;
            }
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_create_2d() -> Result<()> {
        let tensor = Tensor::create(DataType::Float32, &[4, 6])?;

        assert_eq!(tensor.shape(), &[4, 6]);
        assert_eq!(tensor.rank(), 2);
        assert_eq!(tensor.numel(), 24);
        assert_eq!(tensor.size_bytes(), 96);
        assert_eq!(tensor.pool(), MemoryPool::CpuOnly);
        assert!(tensor.is_owned());
        assert!(tensor.to_f64_vec().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn test_create_scalar_and_empty() -> Result<()> {
        let scalar = Tensor::create(DataType::Float64, &[])?;
        assert_eq!(scalar.numel(), 1);
        assert_eq!(scalar.size_bytes(), 8);

        let empty = Tensor::create(DataType::Float32, &[0])?;
        assert_eq!(empty.numel(), 0);
        assert_eq!(empty.size_bytes(), 0);
        Ok(())
    }

    #[test]
    fn test_create_overflow() {
        let result = Tensor::create(DataType::Float64, &[usize::MAX, 2]);
        assert!(matches!(result, Err(Error::SizeOverflow { .. })));

        let result = Tensor::create(DataType::Float32, &[usize::MAX / 2]);
        assert!(matches!(result, Err(Error::SizeOverflow { .. })));
    }

    #[test]
    fn test_from_buffer_length_checked() {
        let raw = [0u8; 4];
        let result = Tensor::from_buffer(DataType::Float64, &[1], &raw, true);
        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch { expected: 8, actual: 4 })
        ));

        let result = Tensor::from_buffer(DataType::Float32, &[2], &raw, false);
        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn test_from_buffer_alias_and_copy() -> Result<()> {
        let raw = 0.25f32.to_ne_bytes();

        let aliased = Tensor::from_buffer(DataType::Float32, &[1], &raw, false)?;
        assert!(!aliased.is_owned());
        assert_eq!(aliased.as_bytes().as_ptr(), raw.as_ptr());

        let copied = Tensor::from_buffer(DataType::Float32, &[1], &raw, true)?;
        assert!(copied.is_owned());
        assert_ne!(copied.as_bytes().as_ptr(), raw.as_ptr());

        assert_eq!(aliased.element_f64(0), Some(0.25));
        assert_eq!(copied.element_f64(0), Some(0.25));
        Ok(())
    }

    #[test]
    fn test_into_owned_detaches() -> Result<()> {
        let owned = {
            let raw = 3.0f64.to_ne_bytes();
            let aliased = Tensor::from_buffer(DataType::Float64, &[1], &raw, false)?;
            aliased.into_owned()
        };
        assert!(owned.is_owned());
        assert_eq!(owned.element_f64(0), Some(3.0));
        Ok(())
    }

    #[test]
    fn test_from_vec_and_to_vec() -> Result<()> {
        let tensor = Tensor::from_vec(&[2, 2], vec![1.0f32, 2.0, 3.0, 4.0])?;
        assert_eq!(tensor.datatype(), DataType::Float32);
        assert_eq!(tensor.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0]);

        let result = tensor.to_vec::<f64>();
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_from_vec_length_checked() {
        let result = Tensor::from_vec(&[3], vec![1i32, 2]);
        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch { expected: 12, actual: 8 })
        ));
    }

    #[test]
    fn test_half_elements() -> Result<()> {
        let tensor = Tensor::from_vec(&[2], vec![f16::from_f32(0.5), f16::from_f32(-2.0)])?;
        assert_eq!(tensor.datatype(), DataType::Float16);
        assert_eq!(tensor.to_f64_vec(), vec![0.5, -2.0]);
        Ok(())
    }

    #[test]
    fn test_element_out_of_range() -> Result<()> {
        let tensor = Tensor::from_vec(&[2], vec![1u16, 2])?;
        assert_eq!(tensor.element_f64(1), Some(2.0));
        assert_eq!(tensor.element_f64(2), None);
        assert_eq!(tensor.element_f64(usize::MAX / 2), None);
        assert_eq!(tensor.element_f64(usize::MAX), None);
        Ok(())
    }

    #[test]
    fn test_scalar_f64_any_rank() -> Result<()> {
        let rank0 = Tensor::from_vec(&[], vec![3i8])?;
        let rank2 = Tensor::from_vec(&[1, 1], vec![0.5f32])?;
        let pair = Tensor::from_vec(&[2], vec![1.0f64, 2.0])?;

        assert_eq!(rank0.scalar_f64(), Some(3.0));
        assert_eq!(rank2.scalar_f64(), Some(0.5));
        assert_eq!(pair.scalar_f64(), None);
        Ok(())
    }

    #[test]
    fn test_display_short() -> Result<()> {
        let tensor = Tensor::from_vec(&[3], vec![1.0f32, 0.5, -2.0])?;
        assert_eq!(tensor.to_string(), "tensor<float32>[3] [1, 0.5, -2]");
        Ok(())
    }

    #[test]
    fn test_display_elides_long_tensors() -> Result<()> {
        let data: Vec<i32> = (0..100).collect();
        let tensor = Tensor::from_vec(&[10, 10], data)?;
        let dump = tensor.to_string();

        assert!(dump.starts_with("tensor<int32>[10, 10] [0, 1, 2"));
        assert!(dump.contains("15, ..., 84"));
        assert!(dump.ends_with("99]"));
        Ok(())
    }
}
