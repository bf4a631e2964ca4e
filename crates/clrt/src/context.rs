//! OpenCL contexts.
//!
//! A context owns a set of devices from a single platform along with every buffer and
//! program created against it. Queues, buffers and programs keep their own reference to
//! the context inside the runtime, so dropping a [`Context`] while they are alive is fine;
//! the runtime frees it once the last of them is gone.

use std::ptr;

use crate::device::Device;
use crate::error::{check_handle, ClError, ClResult, ToResult};
use crate::sys::{cl_context, cl_int, cl_uint, CL_SUCCESS};

/// An OpenCL context over one or more devices.
#[derive(Debug)]
pub struct Context {
    inner: cl_context,
}

unsafe impl Send for Context {}
unsafe impl Sync for Context {}

impl Context {
    /// Create a context over `devices`, which must all belong to the same platform.
    pub fn new(devices: &[Device]) -> ClResult<Self> {
        if devices.is_empty() {
            return Err(ClError::InvalidValue);
        }
        let api = crate::api()?;
        let ids: Vec<_> = devices.iter().map(|d| d.id).collect();

        let mut status: cl_int = CL_SUCCESS;
        let inner = unsafe {
            (api.clCreateContext)(
                ptr::null(),
                ids.len() as cl_uint,
                ids.as_ptr(),
                None,
                ptr::null_mut(),
                &mut status,
            )
        };
        let inner = check_handle(inner, status)?;
        tracing::trace!("Created context {inner:p} over {} device(s)", devices.len());

        Ok(Context { inner })
    }

    pub fn as_raw(&self) -> cl_context {
        self.inner
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }
        if let Ok(api) = crate::api() {
            if let Err(err) = unsafe { (api.clReleaseContext)(self.inner) }.to_result() {
                tracing::debug!("Failed to release context: {err}");
            }
        }
        self.inner = ptr::null_mut();
    }
}
