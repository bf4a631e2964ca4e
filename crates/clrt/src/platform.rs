//! Functions and types for enumerating OpenCL platforms and retrieving information about them.

use std::ptr;

use crate::device::{Device, DeviceType};
use crate::error::{ClResult, ToResult};
use crate::info::info_string;
use crate::sys::{self, cl_platform_id, cl_platform_info, cl_uint};

/// Opaque handle to an OpenCL platform.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Platform {
    pub(crate) id: cl_platform_id,
}

unsafe impl Send for Platform {}
unsafe impl Sync for Platform {}

impl Platform {
    /// Get the number of platforms the ICD loader knows about.
    pub fn count() -> ClResult<u32> {
        let api = crate::api()?;
        let mut count: cl_uint = 0;
        unsafe { (api.clGetPlatformIDs)(0, ptr::null_mut(), &mut count).to_result()? };
        Ok(count)
    }

    /// Return every available platform, in the order the ICD loader reports them.
    ///
    /// An empty list is returned as-is; loaders that implement `cl_khr_icd` report
    /// `CL_PLATFORM_NOT_FOUND_KHR` instead, which surfaces as an error.
    pub fn all() -> ClResult<Vec<Platform>> {
        let api = crate::api()?;
        let count = Platform::count()?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut ids: Vec<cl_platform_id> = vec![ptr::null_mut(); count as usize];
        unsafe {
            (api.clGetPlatformIDs)(count, ids.as_mut_ptr(), ptr::null_mut()).to_result()?;
        }
        Ok(ids.into_iter().map(|id| Platform { id }).collect())
    }

    /// Number of devices of the given types that belong to this platform.
    ///
    /// The runtime reports `CL_DEVICE_NOT_FOUND` when no device matches; that is passed
    /// through unchanged.
    pub fn device_count(self, device_type: DeviceType) -> ClResult<u32> {
        let api = crate::api()?;
        let mut count: cl_uint = 0;
        unsafe {
            (api.clGetDeviceIDs)(
                self.id,
                device_type.bits(),
                0,
                ptr::null_mut(),
                &mut count,
            )
            .to_result()?;
        }
        Ok(count)
    }

    /// Fetch up to `count` devices of the given types, usually the number reported by
    /// [`device_count`](Platform::device_count).
    pub fn devices(self, device_type: DeviceType, count: u32) -> ClResult<Vec<Device>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let api = crate::api()?;
        let mut ids = vec![ptr::null_mut(); count as usize];
        let mut returned: cl_uint = 0;
        unsafe {
            (api.clGetDeviceIDs)(
                self.id,
                device_type.bits(),
                count,
                ids.as_mut_ptr(),
                &mut returned,
            )
            .to_result()?;
        }
        ids.truncate(returned.min(count) as usize);
        Ok(ids.into_iter().map(|id| Device { id }).collect())
    }

    fn info(self, param: cl_platform_info) -> ClResult<String> {
        let api = crate::api()?;
        info_string(|size, value, size_ret| unsafe {
            (api.clGetPlatformInfo)(self.id, param, size, value, size_ret)
        })
    }

    /// Returns the name of this platform, e.g. `NVIDIA CUDA`.
    pub fn name(self) -> ClResult<String> {
        self.info(sys::CL_PLATFORM_NAME)
    }

    /// Returns the vendor of this platform.
    pub fn vendor(self) -> ClResult<String> {
        self.info(sys::CL_PLATFORM_VENDOR)
    }

    /// Returns the raw version string, e.g. `OpenCL 3.0 CUDA 12.4.131`.
    pub fn version(self) -> ClResult<String> {
        self.info(sys::CL_PLATFORM_VERSION)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fetching_zero_devices_needs_no_runtime() {
        let platform = Platform {
            id: ptr::null_mut(),
        };
        assert_eq!(platform.devices(DeviceType::ALL, 0), Ok(Vec::new()));
    }
}
