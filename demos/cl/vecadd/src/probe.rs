//! The probe itself: a straight line of runtime calls, each checked as soon as it returns.

use std::io::{self, Write};

use clrt::prelude::*;
use tracing::debug;

use crate::runtime::Runtime;

/// How many numbers to add together.
pub const NUMBERS_LEN: usize = 1024;

pub const KERNEL_NAME: &str = "add";

pub static KERNEL_SOURCE: &str = "__kernel void add(__global float *c, __global const float *b, __global const float *a) { int i = get_global_id(0); c[i] = a[i] + b[i]; }";

/// How a probe run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeExit {
    Success,
    /// A checked runtime call (enumeration, build, transfer, argument or dispatch) failed.
    CallFailed,
    /// No devices, or creating a context, queue, program, kernel or buffer failed.
    SetupFailed,
}

impl ProbeExit {
    /// Process exit status for this outcome.
    pub fn code(self) -> i32 {
        match self {
            ProbeExit::Success => 0,
            ProbeExit::CallFailed => 1,
            ProbeExit::SetupFailed => -1,
        }
    }
}

enum Failure {
    Call(ClError),
    Create(&'static str, ClError),
    NoDevices,
    Io(io::Error),
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        Failure::Io(err)
    }
}

trait Checked<T> {
    fn checked(self) -> Result<T, Failure>;
    fn creating(self, what: &'static str) -> Result<T, Failure>;
}

impl<T> Checked<T> for ClResult<T> {
    fn checked(self) -> Result<T, Failure> {
        self.map_err(Failure::Call)
    }

    fn creating(self, what: &'static str) -> Result<T, Failure> {
        self.map_err(|err| Failure::Create(what, err))
    }
}

/// Run the probe against `rt`, writing everything user-visible to `out`.
///
/// Only failures to write to `out` are returned as errors; every runtime failure is
/// reported on `out` and turned into the matching [`ProbeExit`].
pub fn run<R: Runtime, W: Write>(rt: &mut R, out: &mut W) -> io::Result<ProbeExit> {
    let failure = match probe(rt, out) {
        Ok(()) => return Ok(ProbeExit::Success),
        Err(failure) => failure,
    };

    match failure {
        Failure::Call(err) => {
            debug!("Runtime call failed: {err}");
            writeln!(out, "Error: {}", err.code())?;
            Ok(ProbeExit::CallFailed)
        }
        Failure::Create(what, err) => {
            debug!("Creating {what} failed: {err}");
            writeln!(out, "Error creating {what}: {}", err.code())?;
            Ok(ProbeExit::SetupFailed)
        }
        Failure::NoDevices => {
            writeln!(out, "no devices found")?;
            Ok(ProbeExit::SetupFailed)
        }
        Failure::Io(err) => Err(err),
    }
}

fn probe<R: Runtime, W: Write>(rt: &mut R, out: &mut W) -> Result<(), Failure> {
    let platforms = rt.platforms().checked()?;
    if platforms.is_empty() {
        return Err(Failure::Call(ClError::PlatformNotFoundKhr));
    }
    writeln!(out, "Platform count: {}", platforms.len())?;

    // Only the last platform's devices are kept.
    let mut devices = Vec::new();
    for platform in platforms {
        let count = rt.device_count(platform).checked()?;
        writeln!(out, "Device count {count}")?;
        devices = rt.devices(platform, count).checked()?;
    }
    let Some(&device) = devices.first() else {
        return Err(Failure::NoDevices);
    };
    debug!("Using the first of {} device(s)", devices.len());

    let ctx = rt.create_context(&devices).creating("context")?;
    let queue = rt.create_queue(&ctx, device).creating("command queue")?;
    let program = rt.create_program(&ctx, KERNEL_SOURCE).creating("program")?;
    rt.build_program(&program, device).checked()?;
    let kernel = rt.create_kernel(&program, KERNEL_NAME).creating("kernel")?;

    let a: Vec<f32> = (0..NUMBERS_LEN).map(|i| i as f32).collect();
    let b: Vec<f32> = (0..NUMBERS_LEN).map(|i| i as f32).collect();
    let mut c = vec![0.0f32; NUMBERS_LEN];

    let a_buf = rt
        .create_buffer(&ctx, MemFlags::READ_ONLY, NUMBERS_LEN)
        .creating("buffer")?;
    let b_buf = rt
        .create_buffer(&ctx, MemFlags::READ_ONLY, NUMBERS_LEN)
        .creating("buffer")?;
    let c_buf = rt
        .create_buffer(&ctx, MemFlags::WRITE_ONLY, NUMBERS_LEN)
        .creating("buffer")?;

    rt.write_buffer(&queue, &a_buf, &a).checked()?;
    rt.write_buffer(&queue, &b_buf, &b).checked()?;

    // The kernel signature is add(c, b, a).
    rt.set_kernel_arg(&kernel, 0, &c_buf).checked()?;
    rt.set_kernel_arg(&kernel, 1, &b_buf).checked()?;
    rt.set_kernel_arg(&kernel, 2, &a_buf).checked()?;

    rt.enqueue_kernel(&queue, &kernel, GlobalSize::x(NUMBERS_LEN))
        .checked()?;
    rt.read_buffer(&queue, &c_buf, &mut c).checked()?;

    for value in &c {
        writeln!(out, "{value:.6}")?;
    }
    Ok(())
}
