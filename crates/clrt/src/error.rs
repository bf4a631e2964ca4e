//! Types for error handling
//!
//! # Error handling in OpenCL:
//!
//! Every OpenCL entry point reports a signed status code, either as its return value or
//! through an `errcode_ret` out-parameter. clrt turns every non-success code into a
//! [`ClError`]. The raw code is never lost: [`ClError::code`] returns exactly what the
//! runtime reported, including codes this crate has no name for.

use std::error::Error;
use std::fmt;

use crate::sys::{self, cl_int};

/// Status reported when the OpenCL library could not be loaded. Not an OpenCL code.
pub const LIBRARY_NOT_LOADED: cl_int = -100_100;

macro_rules! cl_errors {
    ($($variant:ident = $code:ident),* $(,)?) => {
        /// Error enum which represents the status codes returned by the OpenCL API.
        #[allow(missing_docs)]
        #[non_exhaustive]
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum ClError {
            $($variant,)*

            // clrt errors
            /// The OpenCL library has not been loaded, see [`crate::init`].
            LibraryNotLoaded,
            /// A status code that is not part of the OpenCL 1.2 headers.
            Unknown(cl_int),
        }

        impl ClError {
            /// Maps a non-success status code to its variant.
            pub fn from_code(code: cl_int) -> ClError {
                match code {
                    $(sys::$code => ClError::$variant,)*
                    LIBRARY_NOT_LOADED => ClError::LibraryNotLoaded,
                    other => ClError::Unknown(other),
                }
            }

            /// The raw status code, as the runtime reported it.
            pub fn code(self) -> cl_int {
                match self {
                    $(ClError::$variant => sys::$code,)*
                    ClError::LibraryNotLoaded => LIBRARY_NOT_LOADED,
                    ClError::Unknown(code) => code,
                }
            }

            /// The symbolic name from `CL/cl.h`, if there is one.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(ClError::$variant => Some(stringify!($code)),)*
                    ClError::LibraryNotLoaded | ClError::Unknown(_) => None,
                }
            }
        }
    };
}

cl_errors! {
    DeviceNotFound = CL_DEVICE_NOT_FOUND,
    DeviceNotAvailable = CL_DEVICE_NOT_AVAILABLE,
    CompilerNotAvailable = CL_COMPILER_NOT_AVAILABLE,
    MemObjectAllocationFailure = CL_MEM_OBJECT_ALLOCATION_FAILURE,
    OutOfResources = CL_OUT_OF_RESOURCES,
    OutOfHostMemory = CL_OUT_OF_HOST_MEMORY,
    ProfilingInfoNotAvailable = CL_PROFILING_INFO_NOT_AVAILABLE,
    MemCopyOverlap = CL_MEM_COPY_OVERLAP,
    ImageFormatMismatch = CL_IMAGE_FORMAT_MISMATCH,
    ImageFormatNotSupported = CL_IMAGE_FORMAT_NOT_SUPPORTED,
    BuildProgramFailure = CL_BUILD_PROGRAM_FAILURE,
    MapFailure = CL_MAP_FAILURE,
    MisalignedSubBufferOffset = CL_MISALIGNED_SUB_BUFFER_OFFSET,
    ExecStatusErrorForEventsInWaitList = CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST,
    CompileProgramFailure = CL_COMPILE_PROGRAM_FAILURE,
    LinkerNotAvailable = CL_LINKER_NOT_AVAILABLE,
    LinkProgramFailure = CL_LINK_PROGRAM_FAILURE,
    DevicePartitionFailed = CL_DEVICE_PARTITION_FAILED,
    KernelArgInfoNotAvailable = CL_KERNEL_ARG_INFO_NOT_AVAILABLE,
    InvalidValue = CL_INVALID_VALUE,
    InvalidDeviceType = CL_INVALID_DEVICE_TYPE,
    InvalidPlatform = CL_INVALID_PLATFORM,
    InvalidDevice = CL_INVALID_DEVICE,
    InvalidContext = CL_INVALID_CONTEXT,
    InvalidQueueProperties = CL_INVALID_QUEUE_PROPERTIES,
    InvalidCommandQueue = CL_INVALID_COMMAND_QUEUE,
    InvalidHostPtr = CL_INVALID_HOST_PTR,
    InvalidMemObject = CL_INVALID_MEM_OBJECT,
    InvalidImageFormatDescriptor = CL_INVALID_IMAGE_FORMAT_DESCRIPTOR,
    InvalidImageSize = CL_INVALID_IMAGE_SIZE,
    InvalidSampler = CL_INVALID_SAMPLER,
    InvalidBinary = CL_INVALID_BINARY,
    InvalidBuildOptions = CL_INVALID_BUILD_OPTIONS,
    InvalidProgram = CL_INVALID_PROGRAM,
    InvalidProgramExecutable = CL_INVALID_PROGRAM_EXECUTABLE,
    InvalidKernelName = CL_INVALID_KERNEL_NAME,
    InvalidKernelDefinition = CL_INVALID_KERNEL_DEFINITION,
    InvalidKernel = CL_INVALID_KERNEL,
    InvalidArgIndex = CL_INVALID_ARG_INDEX,
    InvalidArgValue = CL_INVALID_ARG_VALUE,
    InvalidArgSize = CL_INVALID_ARG_SIZE,
    InvalidKernelArgs = CL_INVALID_KERNEL_ARGS,
    InvalidWorkDimension = CL_INVALID_WORK_DIMENSION,
    InvalidWorkGroupSize = CL_INVALID_WORK_GROUP_SIZE,
    InvalidWorkItemSize = CL_INVALID_WORK_ITEM_SIZE,
    InvalidGlobalOffset = CL_INVALID_GLOBAL_OFFSET,
    InvalidEventWaitList = CL_INVALID_EVENT_WAIT_LIST,
    InvalidEvent = CL_INVALID_EVENT,
    InvalidOperation = CL_INVALID_OPERATION,
    InvalidGlObject = CL_INVALID_GL_OBJECT,
    InvalidBufferSize = CL_INVALID_BUFFER_SIZE,
    InvalidMipLevel = CL_INVALID_MIP_LEVEL,
    InvalidGlobalWorkSize = CL_INVALID_GLOBAL_WORK_SIZE,
    InvalidProperty = CL_INVALID_PROPERTY,
    InvalidImageDescriptor = CL_INVALID_IMAGE_DESCRIPTOR,
    InvalidCompilerOptions = CL_INVALID_COMPILER_OPTIONS,
    InvalidLinkerOptions = CL_INVALID_LINKER_OPTIONS,
    InvalidDevicePartitionCount = CL_INVALID_DEVICE_PARTITION_COUNT,
    PlatformNotFoundKhr = CL_PLATFORM_NOT_FOUND_KHR,
}

impl fmt::Display for ClError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ClError::LibraryNotLoaded => write!(f, "OpenCL library not loaded"),
            ClError::Unknown(code) => write!(f, "Unknown OpenCL error ({code})"),
            other => match other.name() {
                Some(name) => write!(f, "{name} ({})", other.code()),
                None => write!(f, "OpenCL error ({})", other.code()),
            },
        }
    }
}
impl Error for ClError {}

/// Result type for most OpenCL functions.
pub type ClResult<T> = Result<T, ClError>;

pub(crate) trait ToResult {
    fn to_result(self) -> ClResult<()>;
}
impl ToResult for cl_int {
    fn to_result(self) -> ClResult<()> {
        match self {
            sys::CL_SUCCESS => Ok(()),
            code => Err(ClError::from_code(code)),
        }
    }
}

/// Checks a handle returned alongside an `errcode_ret` out-parameter.
pub(crate) fn check_handle<T>(handle: *mut T, status: cl_int) -> ClResult<*mut T> {
    status.to_result()?;
    if handle.is_null() {
        // Some ICDs report success and still hand back nothing.
        return Err(ClError::InvalidValue);
    }
    Ok(handle)
}
