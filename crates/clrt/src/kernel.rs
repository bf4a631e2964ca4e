//! Kernels and the sizes they are launched with.

use std::ffi::{c_void, CString};
use std::mem;
use std::ptr;

use bytemuck::Pod;

use crate::error::{check_handle, ClError, ClResult, ToResult};
use crate::memory::Buffer;
use crate::program::Program;
use crate::sys::{cl_int, cl_kernel, cl_mem, cl_uint, CL_SUCCESS};

/// Number of work-items to launch in each dimension.
///
/// Each component must be at least 1; a size with `y == 1` and `z == 1` is a
/// one-dimensional launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSize {
    /// Work-items along x
    pub x: usize,
    /// Work-items along y
    pub y: usize,
    /// Work-items along z
    pub z: usize,
}

/// Dimensions of a work-group.
///
/// The product of the components may not exceed the device's maximum work-group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSize {
    /// Work-items along x
    pub x: usize,
    /// Work-items along y
    pub y: usize,
    /// Work-items along z
    pub z: usize,
}

macro_rules! work_size {
    ($name:ident) => {
        impl $name {
            /// Create a one-dimensional size of `x` work-items
            #[inline]
            pub fn x(x: usize) -> $name {
                $name { x, y: 1, z: 1 }
            }

            /// Create a two-dimensional size of `x * y` work-items
            #[inline]
            pub fn xy(x: usize, y: usize) -> $name {
                $name { x, y, z: 1 }
            }

            /// Create a three-dimensional size of `x * y * z` work-items
            #[inline]
            pub fn xyz(x: usize, y: usize, z: usize) -> $name {
                $name { x, y, z }
            }

            /// Number of dimensions the runtime is told about.
            pub fn dims(&self) -> cl_uint {
                if self.z > 1 {
                    3
                } else if self.y > 1 {
                    2
                } else {
                    1
                }
            }

            /// Total number of work-items.
            pub fn count(&self) -> usize {
                self.x * self.y * self.z
            }

            pub(crate) fn as_array(&self) -> [usize; 3] {
                [self.x, self.y, self.z]
            }
        }
        impl From<usize> for $name {
            fn from(x: usize) -> $name {
                $name::x(x)
            }
        }
        impl From<(usize, usize)> for $name {
            fn from((x, y): (usize, usize)) -> $name {
                $name::xy(x, y)
            }
        }
        impl From<(usize, usize, usize)> for $name {
            fn from((x, y, z): (usize, usize, usize)) -> $name {
                $name::xyz(x, y, z)
            }
        }
        impl From<&$name> for $name {
            fn from(other: &$name) -> $name {
                *other
            }
        }
    };
}

work_size!(GlobalSize);
work_size!(LocalSize);

/// Values that can be bound to a kernel parameter.
///
/// # Safety
///
/// `arg_ptr` must point to `arg_size` readable bytes laid out the way the kernel parameter
/// expects, for as long as `self` is borrowed.
pub unsafe trait KernelArg {
    fn arg_size(&self) -> usize;
    fn arg_ptr(&self) -> *const c_void;
}

unsafe impl<T: Pod> KernelArg for Buffer<T> {
    fn arg_size(&self) -> usize {
        mem::size_of::<cl_mem>()
    }

    fn arg_ptr(&self) -> *const c_void {
        self.raw_ref() as *const cl_mem as *const c_void
    }
}

macro_rules! scalar_arg {
    ($($ty:ty),*) => {
        $(
            unsafe impl KernelArg for $ty {
                fn arg_size(&self) -> usize {
                    mem::size_of::<$ty>()
                }

                fn arg_ptr(&self) -> *const c_void {
                    self as *const $ty as *const c_void
                }
            }
        )*
    };
}

scalar_arg!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// A kernel extracted from a built [`Program`].
///
/// Arguments are stored in the kernel object itself, so a kernel may be shared between
/// threads but not configured from several at once.
#[derive(Debug)]
pub struct Kernel {
    inner: cl_kernel,
    name: String,
}

unsafe impl Send for Kernel {}

impl Kernel {
    /// Extract the kernel called `name` from `program`.
    pub fn new(program: &Program, name: &str) -> ClResult<Self> {
        let api = crate::api()?;
        let c_name = CString::new(name).map_err(|_| ClError::InvalidKernelName)?;
        let mut status: cl_int = CL_SUCCESS;
        let inner = unsafe { (api.clCreateKernel)(program.as_raw(), c_name.as_ptr(), &mut status) };
        let inner = check_handle(inner, status)?;
        tracing::trace!("Created kernel `{name}` ({inner:p})");
        Ok(Kernel {
            inner,
            name: name.to_owned(),
        })
    }

    /// Bind `arg` to parameter `index`. The value is copied, so `arg` may be dropped after
    /// this returns; buffers stay referenced by the kernel until rebound.
    pub fn set_arg<A: KernelArg + ?Sized>(&self, index: u32, arg: &A) -> ClResult<()> {
        let api = crate::api()?;
        unsafe {
            (api.clSetKernelArg)(self.inner, index, arg.arg_size(), arg.arg_ptr()).to_result()
        }
    }

    /// The function name this kernel was created from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_raw(&self) -> cl_kernel {
        self.inner
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }
        if let Ok(api) = crate::api() {
            if let Err(err) = unsafe { (api.clReleaseKernel)(self.inner) }.to_result() {
                tracing::debug!("Failed to release kernel `{}`: {err}", self.name);
            }
        }
        self.inner = ptr::null_mut();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dims_follow_the_highest_non_unit_component() {
        assert_eq!(GlobalSize::x(1024).dims(), 1);
        assert_eq!(GlobalSize::xy(32, 32).dims(), 2);
        assert_eq!(GlobalSize::xyz(8, 1, 4).dims(), 3);
        assert_eq!(LocalSize::xy(64, 1).dims(), 1);
    }

    #[test]
    fn conversions() {
        assert_eq!(GlobalSize::from(1024), GlobalSize { x: 1024, y: 1, z: 1 });
        assert_eq!(GlobalSize::from((4, 8)).count(), 32);
        assert_eq!(LocalSize::from((2, 2, 2)).as_array(), [2, 2, 2]);
        let size = GlobalSize::x(7);
        assert_eq!(GlobalSize::from(&size), size);
    }

    #[test]
    fn scalar_args_point_at_their_value() {
        let value = 3.5f32;
        assert_eq!(value.arg_size(), 4);
        let read = unsafe { *(value.arg_ptr() as *const f32) };
        assert_eq!(read, 3.5);
    }
}
