//! Functions and types for retrieving information about OpenCL devices.
//!
//! Devices are always obtained from a [`Platform`](crate::platform::Platform), see
//! [`Platform::devices`](crate::platform::Platform::devices).

use crate::error::ClResult;
use crate::info::{info_string, info_value};
use crate::sys::{self, cl_device_id, cl_device_info, cl_device_type, cl_uint, cl_ulong};

bitflags::bitflags! {
    /// Bit flags selecting which kinds of devices to enumerate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceType: cl_device_type {
        /// The platform's default device.
        const DEFAULT = sys::CL_DEVICE_TYPE_DEFAULT;
        /// The host processor.
        const CPU = sys::CL_DEVICE_TYPE_CPU;
        /// A GPU, possibly also used for graphics.
        const GPU = sys::CL_DEVICE_TYPE_GPU;
        /// Dedicated accelerators such as FPGAs or DSPs.
        const ACCELERATOR = sys::CL_DEVICE_TYPE_ACCELERATOR;
        /// Devices that do not support OpenCL C programs.
        const CUSTOM = sys::CL_DEVICE_TYPE_CUSTOM;
        /// Every device of the platform.
        const ALL = sys::CL_DEVICE_TYPE_ALL;
    }
}

/// Opaque handle to an OpenCL device.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Device {
    pub(crate) id: cl_device_id,
}

unsafe impl Send for Device {}
unsafe impl Sync for Device {}

impl Device {
    fn info_string(self, param: cl_device_info) -> ClResult<String> {
        let api = crate::api()?;
        info_string(|size, value, size_ret| unsafe {
            (api.clGetDeviceInfo)(self.id, param, size, value, size_ret)
        })
    }

    fn info_value<T: bytemuck::Pod>(self, param: cl_device_info) -> ClResult<T> {
        let api = crate::api()?;
        info_value(|size, value, size_ret| unsafe {
            (api.clGetDeviceInfo)(self.id, param, size, value, size_ret)
        })
    }

    /// Returns the name of this device.
    pub fn name(self) -> ClResult<String> {
        self.info_string(sys::CL_DEVICE_NAME)
    }

    /// Returns what kind of device this is.
    pub fn device_type(self) -> ClResult<DeviceType> {
        self.info_value::<cl_device_type>(sys::CL_DEVICE_TYPE)
            .map(DeviceType::from_bits_retain)
    }

    /// Number of parallel compute units, at least 1.
    pub fn compute_units(self) -> ClResult<u32> {
        self.info_value::<cl_uint>(sys::CL_DEVICE_MAX_COMPUTE_UNITS)
    }

    /// Size of global device memory in bytes.
    pub fn global_mem_size(self) -> ClResult<u64> {
        self.info_value::<cl_ulong>(sys::CL_DEVICE_GLOBAL_MEM_SIZE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn all_covers_every_named_type() {
        let named = DeviceType::DEFAULT
            | DeviceType::CPU
            | DeviceType::GPU
            | DeviceType::ACCELERATOR
            | DeviceType::CUSTOM;
        assert!(DeviceType::ALL.contains(named));
        assert_eq!(DeviceType::ALL.bits(), 0xFFFF_FFFF);
    }

    #[test]
    fn reported_type_keeps_unknown_bits() {
        let reported = DeviceType::from_bits_retain(sys::CL_DEVICE_TYPE_GPU | (1 << 20));
        assert!(reported.contains(DeviceType::GPU));
        assert!(!reported.contains(DeviceType::CPU));
        assert_eq!(reported.bits() & (1 << 20), 1 << 20);
    }
}
