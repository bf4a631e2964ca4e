//! This module re-exports a number of commonly-used types for working with clrt.
//!
//! This allows the user to `use clrt::prelude::*;` and have the most commonly-used types
//! available quickly.

pub use crate::context::Context;
pub use crate::device::{Device, DeviceType};
pub use crate::error::{ClError, ClResult};
pub use crate::kernel::{GlobalSize, Kernel, KernelArg, LocalSize};
pub use crate::memory::{Buffer, MemFlags};
pub use crate::platform::Platform;
pub use crate::program::Program;
pub use crate::queue::{Queue, QueueProperties};
