//! Functions and types for building OpenCL programs from source.

use std::ffi::{c_char, CString};
use std::ptr;

use crate::context::Context;
use crate::device::Device;
use crate::error::{check_handle, ClError, ClResult, ToResult};
use crate::info::info_string;
use crate::kernel::Kernel;
use crate::sys::{self, cl_int, cl_program, cl_uint, CL_SUCCESS};

/// An OpenCL program, created from OpenCL C source inside a context.
#[derive(Debug)]
pub struct Program {
    inner: cl_program,
}

unsafe impl Send for Program {}
unsafe impl Sync for Program {}

impl Program {
    /// Create a program from OpenCL C source. The program still has to be [built](Program::build)
    /// before kernels can be extracted from it.
    pub fn from_source(ctx: &Context, source: &str) -> ClResult<Self> {
        let api = crate::api()?;
        let strings: [*const c_char; 1] = [source.as_ptr().cast()];
        let lengths = [source.len()];
        let mut status: cl_int = CL_SUCCESS;
        let inner = unsafe {
            (api.clCreateProgramWithSource)(
                ctx.as_raw(),
                1,
                strings.as_ptr(),
                lengths.as_ptr(),
                &mut status,
            )
        };
        let inner = check_handle(inner, status)?;
        tracing::trace!("Created program {inner:p} from {} bytes of source", source.len());
        Ok(Program { inner })
    }

    /// Compile and link the program for `devices` with the given compiler options.
    ///
    /// On `CL_BUILD_PROGRAM_FAILURE` the compiler output is available from
    /// [`Program::build_log`].
    pub fn build(&self, devices: &[Device], options: &str) -> ClResult<()> {
        let api = crate::api()?;
        let options = CString::new(options).map_err(|_| ClError::InvalidBuildOptions)?;
        let ids: Vec<_> = devices.iter().map(|d| d.id).collect();
        unsafe {
            (api.clBuildProgram)(
                self.inner,
                ids.len() as cl_uint,
                ids.as_ptr(),
                options.as_ptr(),
                None,
                ptr::null_mut(),
            )
            .to_result()
        }
    }

    /// The compiler output of the last build for `device`.
    pub fn build_log(&self, device: Device) -> ClResult<String> {
        let api = crate::api()?;
        info_string(|size, value, size_ret| unsafe {
            (api.clGetProgramBuildInfo)(
                self.inner,
                device.id,
                sys::CL_PROGRAM_BUILD_LOG,
                size,
                value,
                size_ret,
            )
        })
    }

    /// Extract the kernel called `name` from this built program.
    pub fn kernel(&self, name: &str) -> ClResult<Kernel> {
        Kernel::new(self, name)
    }

    pub fn as_raw(&self) -> cl_program {
        self.inner
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }
        if let Ok(api) = crate::api() {
            if let Err(err) = unsafe { (api.clReleaseProgram)(self.inner) }.to_result() {
                tracing::debug!("Failed to release program: {err}");
            }
        }
        self.inner = ptr::null_mut();
    }
}
