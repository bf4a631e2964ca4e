//! Raw bindings to the OpenCL 1.2 host API.
//!
//! Nothing is linked at build time. The ICD loader is opened with `libloading` the first
//! time [`load`] is called and every entry point is resolved into an [`Api`] table that
//! lives for the rest of the process. Library discovery follows `find_opencl_helper`.

pub mod types;

use std::error::Error;
use std::ffi::{c_char, c_void};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use libloading::Library;

pub use types::*;

macro_rules! opencl_api {
    ($( $sym:ident ( $($ty:ty),* $(,)? ) -> $ret:ty; )*) => {
        /// Table of OpenCL entry points resolved from the ICD loader.
        #[allow(non_snake_case)]
        pub struct Api {
            path: PathBuf,
            $( pub $sym: unsafe extern "system" fn($($ty),*) -> $ret, )*
            // Keeps every pointer above valid, so it must stay the last field.
            _library: Library,
        }

        impl Api {
            #[allow(non_snake_case)]
            unsafe fn from_library(
                library: Library,
                path: PathBuf,
            ) -> Result<Self, libloading::Error> {
                $(
                    let $sym = *library.get::<unsafe extern "system" fn($($ty),*) -> $ret>(
                        concat!(stringify!($sym), "\0").as_bytes(),
                    )?;
                )*
                Ok(Api { path, $($sym,)* _library: library })
            }
        }
    };
}

opencl_api! {
    clGetPlatformIDs(cl_uint, *mut cl_platform_id, *mut cl_uint) -> cl_int;
    clGetPlatformInfo(cl_platform_id, cl_platform_info, usize, *mut c_void, *mut usize) -> cl_int;
    clGetDeviceIDs(
        cl_platform_id,
        cl_device_type,
        cl_uint,
        *mut cl_device_id,
        *mut cl_uint,
    ) -> cl_int;
    clGetDeviceInfo(cl_device_id, cl_device_info, usize, *mut c_void, *mut usize) -> cl_int;
    clCreateContext(
        *const cl_context_properties,
        cl_uint,
        *const cl_device_id,
        cl_context_notify,
        *mut c_void,
        *mut cl_int,
    ) -> cl_context;
    clReleaseContext(cl_context) -> cl_int;
    clCreateCommandQueue(
        cl_context,
        cl_device_id,
        cl_command_queue_properties,
        *mut cl_int,
    ) -> cl_command_queue;
    clReleaseCommandQueue(cl_command_queue) -> cl_int;
    clCreateProgramWithSource(
        cl_context,
        cl_uint,
        *const *const c_char,
        *const usize,
        *mut cl_int,
    ) -> cl_program;
    clBuildProgram(
        cl_program,
        cl_uint,
        *const cl_device_id,
        *const c_char,
        cl_program_notify,
        *mut c_void,
    ) -> cl_int;
    clGetProgramBuildInfo(
        cl_program,
        cl_device_id,
        cl_program_build_info,
        usize,
        *mut c_void,
        *mut usize,
    ) -> cl_int;
    clReleaseProgram(cl_program) -> cl_int;
    clCreateKernel(cl_program, *const c_char, *mut cl_int) -> cl_kernel;
    clSetKernelArg(cl_kernel, cl_uint, usize, *const c_void) -> cl_int;
    clReleaseKernel(cl_kernel) -> cl_int;
    clCreateBuffer(cl_context, cl_mem_flags, usize, *mut c_void, *mut cl_int) -> cl_mem;
    clReleaseMemObject(cl_mem) -> cl_int;
    clEnqueueWriteBuffer(
        cl_command_queue,
        cl_mem,
        cl_bool,
        usize,
        usize,
        *const c_void,
        cl_uint,
        *const cl_event,
        *mut cl_event,
    ) -> cl_int;
    clEnqueueReadBuffer(
        cl_command_queue,
        cl_mem,
        cl_bool,
        usize,
        usize,
        *mut c_void,
        cl_uint,
        *const cl_event,
        *mut cl_event,
    ) -> cl_int;
    clEnqueueNDRangeKernel(
        cl_command_queue,
        cl_kernel,
        cl_uint,
        *const usize,
        *const usize,
        *const usize,
        cl_uint,
        *const cl_event,
        *mut cl_event,
    ) -> cl_int;
}

impl Api {
    /// Opens the library at `path` and resolves every entry point.
    ///
    /// # Safety
    ///
    /// `path` must name an OpenCL ICD loader; its initializers run on load.
    pub unsafe fn open(path: &Path) -> Result<Self, libloading::Error> {
        let library = Library::new(path)?;
        Api::from_library(library, path.to_path_buf())
    }

    /// The path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Failure to find a usable OpenCL library.
#[derive(Debug)]
pub struct LoadError {
    attempts: Vec<(PathBuf, libloading::Error)>,
}

impl LoadError {
    /// Every candidate that was tried, with the reason it was rejected.
    pub fn attempts(&self) -> &[(PathBuf, libloading::Error)] {
        &self.attempts
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no OpenCL library candidates to load");
        }
        write!(f, "could not load an OpenCL library, tried:")?;
        for (path, err) in &self.attempts {
            write!(f, "\n  {}: {err}", path.display())?;
        }
        Ok(())
    }
}

impl Error for LoadError {}

static API: OnceLock<Api> = OnceLock::new();

/// Loads the OpenCL library, trying each candidate in order. Subsequent calls return
/// the already loaded table.
pub fn load() -> Result<&'static Api, LoadError> {
    if let Some(api) = API.get() {
        return Ok(api);
    }
    load_from(&find_opencl_helper::find_opencl_library_candidates())
}

/// Like [`load`], but only considers the given candidates.
pub fn load_from(candidates: &[PathBuf]) -> Result<&'static Api, LoadError> {
    if let Some(api) = API.get() {
        return Ok(api);
    }

    let mut attempts = Vec::new();
    for path in candidates {
        match unsafe { Api::open(path) } {
            Ok(api) => return Ok(API.get_or_init(move || api)),
            Err(err) => attempts.push((path.clone(), err)),
        }
    }
    Err(LoadError { attempts })
}

/// The loaded table, if [`load`] has succeeded before.
pub fn api() -> Option<&'static Api> {
    API.get()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_candidate_list_is_an_error() {
        // Only meaningful when nothing was loaded by another test in this process.
        if api().is_none() {
            let err = load_from(&[]).unwrap_err();
            assert!(err.attempts().is_empty());
            assert_eq!(err.to_string(), "no OpenCL library candidates to load");
        }
    }

    #[test]
    fn missing_library_is_reported_per_candidate() {
        if api().is_none() {
            let bogus = PathBuf::from("/definitely/not/here/libOpenCL.so.1");
            let err = load_from(std::slice::from_ref(&bogus)).unwrap_err();
            assert_eq!(err.attempts().len(), 1);
            assert_eq!(err.attempts()[0].0, bogus);
            assert!(err.to_string().contains("/definitely/not/here"));
        }
    }
}
