//! Shared plumbing for the `clGet*Info` family.

use std::ffi::c_void;
use std::mem;
use std::ptr;

use bytemuck::Pod;

use crate::error::{ClResult, ToResult};
use crate::sys::cl_int;

/// Runs a size query followed by a fetch and decodes the result as a string.
pub(crate) fn info_string<F>(query: F) -> ClResult<String>
where
    F: Fn(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut size = 0usize;
    query(0, ptr::null_mut(), &mut size).to_result()?;
    let mut bytes = vec![0u8; size];
    if size > 0 {
        query(size, bytes.as_mut_ptr().cast(), ptr::null_mut()).to_result()?;
    }
    Ok(decode_info_string(bytes))
}

/// Fetches a fixed-size value.
pub(crate) fn info_value<T: Pod, F>(query: F) -> ClResult<T>
where
    F: Fn(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut value = T::zeroed();
    query(
        mem::size_of::<T>(),
        (&mut value as *mut T).cast(),
        ptr::null_mut(),
    )
    .to_result()?;
    Ok(value)
}

/// Info strings are NUL-terminated and some vendors pad them with trailing spaces.
pub(crate) fn decode_info_string(mut bytes: Vec<u8>) -> String {
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    String::from_utf8_lossy(&bytes).trim_end().to_owned()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sys::{CL_INVALID_VALUE, CL_SUCCESS};
    use std::cell::Cell;

    #[test]
    fn decode_strips_nul_and_padding() {
        assert_eq!(decode_info_string(b"NVIDIA CUDA  \0".to_vec()), "NVIDIA CUDA");
        assert_eq!(decode_info_string(b"abc\0garbage".to_vec()), "abc");
        assert_eq!(decode_info_string(Vec::new()), "");
    }

    #[test]
    fn string_query_is_size_then_fetch() {
        let calls = Cell::new(0);
        let text = b"Portable Computing Language\0";
        let result = info_string(|size, value, size_ret| {
            calls.set(calls.get() + 1);
            if value.is_null() {
                unsafe { *size_ret = text.len() };
            } else {
                assert_eq!(size, text.len());
                unsafe { ptr::copy_nonoverlapping(text.as_ptr(), value.cast::<u8>(), size) };
            }
            CL_SUCCESS
        });
        assert_eq!(result.unwrap(), "Portable Computing Language");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn value_query_propagates_errors() {
        let result = info_value::<u32, _>(|_, _, _| CL_INVALID_VALUE);
        assert_eq!(result.unwrap_err().code(), CL_INVALID_VALUE);

        let result = info_value::<u64, _>(|size, value, _| {
            assert_eq!(size, 8);
            unsafe { *value.cast::<u64>() = 8 << 30 };
            CL_SUCCESS
        });
        assert_eq!(result.unwrap(), 8 << 30);
    }
}
