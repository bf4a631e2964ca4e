//! Safe and user-friendly wrapper around the OpenCL host API.
//!
//! # Low level OpenCL interop
//!
//! Contexts, programs, kernels and buffers expose their raw handle through `as_raw`, and the
//! raw bindings are re-exported as the [`sys`] module, so code that needs an entry point
//! this crate does not cover can still reach it.
//!
//! # OpenCL Terminology:
//!
//! ## Platforms and Devices:
//!
//! A platform is one vendor's OpenCL implementation installed on the host. The ICD loader
//! lets several of them coexist, so a machine with an NVIDIA card and an Intel CPU runtime
//! usually reports two platforms. Each platform exposes zero or more devices: GPUs, CPUs or
//! other accelerators able to run kernels. Data must be transferred from host memory to
//! device memory before a device can use it, and results must be transferred back.
//!
//! ## Contexts, Queues, Programs and Kernels:
//!
//! A context groups a set of devices of one platform together with every buffer and
//! program created against it. Commands reach a device through a command queue, which
//! belongs to exactly one context and one device. Programs are compiled at runtime from
//! OpenCL C source for the devices of their context, and kernels are the entry points
//! extracted from a built program.
//!
//! ## NDRanges and Work-groups:
//!
//! A kernel is launched over an index space of one to three dimensions, the global work
//! size. Work-items are grouped into work-groups of the local work size; when no local
//! size is given the runtime chooses one.
//!
//! # Usage:
//!
//! Nothing is linked at build time. Call [`init`] once to load the OpenCL ICD loader; every
//! other function fails with [`ClError::LibraryNotLoaded`](error::ClError::LibraryNotLoaded)
//! until it succeeds. clrt looks for the library in the usual system locations, and
//! `OPENCL_LIBRARY_PATH` can point it somewhere else.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod device;
pub mod error;
mod info;
pub mod kernel;
pub mod memory;
pub mod platform;
pub mod prelude;
pub mod program;
pub mod queue;

pub use clrt_raw as sys;

use crate::error::{ClError, ClResult};

/// Load the OpenCL library.
///
/// This must be called before any other clrt function is called. Loading is done once per
/// process, calling this again is cheap.
pub fn init() -> ClResult<()> {
    match sys::load() {
        Ok(api) => {
            tracing::debug!("Loaded OpenCL from `{}`", api.path().display());
            Ok(())
        }
        Err(err) => {
            tracing::error!("{err}");
            Err(ClError::LibraryNotLoaded)
        }
    }
}

pub(crate) fn api() -> ClResult<&'static sys::Api> {
    sys::api().ok_or(ClError::LibraryNotLoaded)
}
