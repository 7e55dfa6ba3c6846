//! Host byte storage backing tensors
//!
//! A [`HostBuffer`] either owns its bytes or borrows them from the caller.
//! Borrowed buffers carry the caller's lifetime, so a tensor aliasing a
//! stack array cannot escape the frame that owns the array.

use crate::error::{Error, Result};

/// Memory pool type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryPool {
    /// Host-addressable memory, not mirrored on any device
    #[default]
    CpuOnly,
}

/// Contiguous byte storage, owned or borrowed
#[derive(Debug, Clone)]
pub enum HostBuffer<'a> {
    /// Storage allocated by and owned by the tensor
    Owned(Vec<u8>),
    /// Storage aliased from the caller
    Borrowed(&'a [u8]),
}

impl HostBuffer<'static> {
    /// Allocate `size` zeroed bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the allocator cannot reserve `size` bytes.
    #[tracing::instrument(level = "trace")]
    pub fn zeroed(size: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory { requested: size })?;
        bytes.resize(size, 0);
        Ok(HostBuffer::Owned(bytes))
    }

    /// Copy `src` into a new owned buffer
    pub fn copied(src: &[u8]) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(src.len())
            .map_err(|_| Error::OutOfMemory { requested: src.len() })?;
        bytes.extend_from_slice(src);
        Ok(HostBuffer::Owned(bytes))
    }
}

impl<'a> HostBuffer<'a> {
    /// Alias `src` without copying
    pub fn borrowed(src: &'a [u8]) -> Self {
        HostBuffer::Borrowed(src)
    }

    /// Get number of bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the bytes belong to this buffer
    pub fn is_owned(&self) -> bool {
        matches!(self, HostBuffer::Owned(_))
    }

    /// View the bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HostBuffer::Owned(bytes) => bytes,
            HostBuffer::Borrowed(bytes) => bytes,
        }
    }

    /// Mutable view of the bytes
    ///
    /// A borrowed buffer is first detached into an owned copy; the caller's
    /// memory is never written.
    pub fn make_mut(&mut self) -> &mut [u8] {
        if let HostBuffer::Borrowed(bytes) = *self {
            *self = HostBuffer::Owned(bytes.to_vec());
        }
        match self {
            HostBuffer::Owned(bytes) => bytes,
            HostBuffer::Borrowed(_) => unreachable!("detached above"),
        }
    }

    /// Detach from the caller's lifetime, copying if borrowed
    pub fn into_owned(self) -> HostBuffer<'static> {
        match self {
            HostBuffer::Owned(bytes) => HostBuffer::Owned(bytes),
            HostBuffer::Borrowed(bytes) => HostBuffer::Owned(bytes.to_vec()),
        }
    }
}
