//! Command queues.
//!
//! Every transfer and kernel launch is submitted to a device through a [`Queue`]. Commands
//! in an in-order queue execute one after another in submission order. The transfer
//! methods here are blocking: they return only once the data has been copied, so the host
//! slice can be reused immediately.

use std::ptr;

use bytemuck::Pod;

use crate::context::Context;
use crate::device::Device;
use crate::error::{check_handle, ClError, ClResult, ToResult};
use crate::kernel::{GlobalSize, Kernel, LocalSize};
use crate::memory::Buffer;
use crate::sys::{self, cl_command_queue, cl_command_queue_properties, cl_int, CL_SUCCESS, CL_TRUE};

bitflags::bitflags! {
    /// Bit flags for configuring a command queue.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueueProperties: cl_command_queue_properties {
        /// Commands may execute in any order; ordering has to be expressed with events.
        const OUT_OF_ORDER_EXEC_MODE_ENABLE = sys::CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE;
        /// Record timing information for every command.
        const PROFILING_ENABLE = sys::CL_QUEUE_PROFILING_ENABLE;
    }
}

/// A queue of work for one device of a context.
#[derive(Debug)]
pub struct Queue {
    inner: cl_command_queue,
}

unsafe impl Send for Queue {}
unsafe impl Sync for Queue {}

impl Queue {
    /// Create a queue that submits to `device`, which must be one of the context's devices.
    pub fn new(ctx: &Context, device: Device, properties: QueueProperties) -> ClResult<Self> {
        let api = crate::api()?;
        let mut status: cl_int = CL_SUCCESS;
        let inner = unsafe {
            (api.clCreateCommandQueue)(ctx.as_raw(), device.id, properties.bits(), &mut status)
        };
        let inner = check_handle(inner, status)?;
        tracing::trace!("Created command queue {inner:p}");
        Ok(Queue { inner })
    }

    /// Copy `data` into the start of `buffer`, blocking until the copy is complete.
    pub fn write<T: Pod>(&self, buffer: &Buffer<T>, data: &[T]) -> ClResult<()> {
        if data.len() > buffer.len() {
            return Err(ClError::InvalidValue);
        }
        let api = crate::api()?;
        let size = std::mem::size_of_val(data);
        tracing::trace!("Writing {size} bytes to buffer {:p}", buffer.as_raw());
        unsafe {
            (api.clEnqueueWriteBuffer)(
                self.inner,
                buffer.as_raw(),
                CL_TRUE,
                0,
                size,
                data.as_ptr().cast(),
                0,
                ptr::null(),
                ptr::null_mut(),
            )
            .to_result()
        }
    }

    /// Copy the start of `buffer` into `out`, blocking until the copy is complete.
    pub fn read<T: Pod>(&self, buffer: &Buffer<T>, out: &mut [T]) -> ClResult<()> {
        if out.len() > buffer.len() {
            return Err(ClError::InvalidValue);
        }
        let api = crate::api()?;
        let size = std::mem::size_of_val(out);
        tracing::trace!("Reading {size} bytes from buffer {:p}", buffer.as_raw());
        unsafe {
            (api.clEnqueueReadBuffer)(
                self.inner,
                buffer.as_raw(),
                CL_TRUE,
                0,
                size,
                out.as_mut_ptr().cast(),
                0,
                ptr::null(),
                ptr::null_mut(),
            )
            .to_result()
        }
    }

    /// Enqueue `kernel` over `global` work-items. Without a `local` size the runtime picks
    /// the work-group size.
    ///
    /// Every argument of the kernel must have been set beforehand.
    pub fn launch(
        &self,
        kernel: &Kernel,
        global: impl Into<GlobalSize>,
        local: Option<LocalSize>,
    ) -> ClResult<()> {
        let api = crate::api()?;
        let global = global.into();
        let dims = local.map_or(global.dims(), |local| global.dims().max(local.dims()));
        let global_sizes = global.as_array();
        let local_sizes = local.map(|local| local.as_array());
        let local_ptr = local_sizes
            .as_ref()
            .map_or(ptr::null(), |sizes| sizes.as_ptr());

        tracing::trace!(
            "Launching `{}` over {:?} (local {:?})",
            kernel.name(),
            &global_sizes[..dims as usize],
            local_sizes
        );
        unsafe {
            (api.clEnqueueNDRangeKernel)(
                self.inner,
                kernel.as_raw(),
                dims,
                ptr::null(),
                global_sizes.as_ptr(),
                local_ptr,
                0,
                ptr::null(),
                ptr::null_mut(),
            )
            .to_result()
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }
        if let Ok(api) = crate::api() {
            if let Err(err) = unsafe { (api.clReleaseCommandQueue)(self.inner) }.to_result() {
                tracing::debug!("Failed to release command queue: {err}");
            }
        }
        self.inner = ptr::null_mut();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn queue_properties_match_header_bits() {
        assert_eq!(QueueProperties::empty().bits(), 0);
        assert_eq!(QueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE.bits(), 1);
        assert_eq!(QueueProperties::PROFILING_ENABLE.bits(), 2);
    }
}
