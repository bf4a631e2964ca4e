//! Device memory.
//!
//! A [`Buffer`] is a typed allocation in the memory of a context. The host never touches
//! device memory directly: data moves in and out through [`Queue::write`] and
//! [`Queue::read`], and kernels see the buffer through [`Kernel::set_arg`].
//!
//! Element types must be [`Pod`] so that their bytes can be copied across without
//! conversion.
//!
//! [`Queue::write`]: crate::queue::Queue::write
//! [`Queue::read`]: crate::queue::Queue::read
//! [`Kernel::set_arg`]: crate::kernel::Kernel::set_arg

use std::marker::PhantomData;
use std::mem;
use std::ptr;

use bytemuck::Pod;

use crate::context::Context;
use crate::error::{check_handle, ClError, ClResult, ToResult};
use crate::sys::{self, cl_int, cl_mem, cl_mem_flags, CL_SUCCESS};

bitflags::bitflags! {
    /// Bit flags describing how a buffer is allocated and accessed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemFlags: cl_mem_flags {
        /// Kernels may read and write the buffer. This is the default.
        const READ_WRITE = sys::CL_MEM_READ_WRITE;
        /// Kernels only write the buffer.
        const WRITE_ONLY = sys::CL_MEM_WRITE_ONLY;
        /// Kernels only read the buffer.
        const READ_ONLY = sys::CL_MEM_READ_ONLY;
        /// Use the host allocation as backing storage.
        const USE_HOST_PTR = sys::CL_MEM_USE_HOST_PTR;
        /// Allocate from host-accessible memory.
        const ALLOC_HOST_PTR = sys::CL_MEM_ALLOC_HOST_PTR;
        /// Initialize the buffer from host memory at creation.
        const COPY_HOST_PTR = sys::CL_MEM_COPY_HOST_PTR;
        /// The host only writes the buffer.
        const HOST_WRITE_ONLY = sys::CL_MEM_HOST_WRITE_ONLY;
        /// The host only reads the buffer.
        const HOST_READ_ONLY = sys::CL_MEM_HOST_READ_ONLY;
        /// The host never accesses the buffer.
        const HOST_NO_ACCESS = sys::CL_MEM_HOST_NO_ACCESS;
    }
}

/// Number of bytes needed for `len` elements of `T`.
///
/// Zero-sized and overflowing requests are rejected up front with `CL_INVALID_BUFFER_SIZE`,
/// the code the runtime itself would report.
pub fn byte_size<T>(len: usize) -> ClResult<usize> {
    match len.checked_mul(mem::size_of::<T>()) {
        Some(0) | None => Err(ClError::InvalidBufferSize),
        Some(size) => Ok(size),
    }
}

/// Fixed-size device buffer of `len` elements of `T`.
#[derive(Debug)]
pub struct Buffer<T: Pod> {
    inner: cl_mem,
    len: usize,
    _marker: PhantomData<T>,
}

unsafe impl<T: Pod + Send> Send for Buffer<T> {}
unsafe impl<T: Pod + Sync> Sync for Buffer<T> {}

impl<T: Pod> Buffer<T> {
    /// Allocate an uninitialized buffer of `len` elements.
    ///
    /// The contents are unspecified until written by [`Queue::write`](crate::queue::Queue::write)
    /// or a kernel; since `T` is `Pod`, reading them early is wrong but not unsound.
    pub fn new(ctx: &Context, flags: MemFlags, len: usize) -> ClResult<Self> {
        let size = byte_size::<T>(len)?;
        let api = crate::api()?;
        let mut status: cl_int = CL_SUCCESS;
        let inner = unsafe {
            (api.clCreateBuffer)(ctx.as_raw(), flags.bits(), size, ptr::null_mut(), &mut status)
        };
        let inner = check_handle(inner, status)?;
        tracing::trace!("Created {size} byte buffer {inner:p} ({flags:?})");
        Ok(Buffer {
            inner,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Buffers can't be zero-sized, this is here to keep clippy quiet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_raw(&self) -> cl_mem {
        self.inner
    }

    pub(crate) fn raw_ref(&self) -> &cl_mem {
        &self.inner
    }
}

impl<T: Pod> Drop for Buffer<T> {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }
        if let Ok(api) = crate::api() {
            if let Err(err) = unsafe { (api.clReleaseMemObject)(self.inner) }.to_result() {
                tracing::debug!("Failed to release buffer: {err}");
            }
        }
        self.inner = ptr::null_mut();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn byte_size_of_floats() {
        assert_eq!(byte_size::<f32>(1024), Ok(4096));
        assert_eq!(byte_size::<u64>(3), Ok(24));
    }

    #[test]
    fn byte_size_rejects_empty_and_overflow() {
        assert_eq!(byte_size::<f32>(0), Err(ClError::InvalidBufferSize));
        assert_eq!(byte_size::<()>(10), Err(ClError::InvalidBufferSize));
        assert_eq!(byte_size::<u32>(usize::MAX), Err(ClError::InvalidBufferSize));
    }

    #[test]
    fn access_flags_match_header_bits() {
        assert_eq!(MemFlags::READ_ONLY.bits(), 1 << 2);
        assert_eq!(MemFlags::WRITE_ONLY.bits(), 1 << 1);
        assert!(!MemFlags::READ_ONLY.intersects(MemFlags::WRITE_ONLY));
    }
}
