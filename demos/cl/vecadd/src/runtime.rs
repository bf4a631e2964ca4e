//! The slice of the OpenCL API the probe needs, as a trait, and its implementation on top
//! of clrt.

use clrt::prelude::*;
use tracing::{debug, error};

/// Everything the probe asks of the compute runtime, one method per runtime call.
///
/// Handles are associated types so the probe never depends on what backs them.
pub trait Runtime {
    type Platform: Copy;
    type Device: Copy;
    type Context;
    type Queue;
    type Program;
    type Kernel;
    type Buffer;

    fn platforms(&mut self) -> ClResult<Vec<Self::Platform>>;
    fn device_count(&mut self, platform: Self::Platform) -> ClResult<u32>;
    /// Fetch the `count` devices reported by [`Runtime::device_count`].
    fn devices(&mut self, platform: Self::Platform, count: u32) -> ClResult<Vec<Self::Device>>;
    fn create_context(&mut self, devices: &[Self::Device]) -> ClResult<Self::Context>;
    fn create_queue(&mut self, ctx: &Self::Context, device: Self::Device) -> ClResult<Self::Queue>;
    fn create_program(&mut self, ctx: &Self::Context, source: &str) -> ClResult<Self::Program>;
    fn build_program(&mut self, program: &Self::Program, device: Self::Device) -> ClResult<()>;
    fn create_kernel(&mut self, program: &Self::Program, name: &str) -> ClResult<Self::Kernel>;
    fn create_buffer(
        &mut self,
        ctx: &Self::Context,
        flags: MemFlags,
        len: usize,
    ) -> ClResult<Self::Buffer>;
    /// Blocking host to device copy.
    fn write_buffer(
        &mut self,
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        data: &[f32],
    ) -> ClResult<()>;
    fn set_kernel_arg(
        &mut self,
        kernel: &Self::Kernel,
        index: u32,
        buffer: &Self::Buffer,
    ) -> ClResult<()>;
    /// Dispatch with no local size; the runtime picks one.
    fn enqueue_kernel(
        &mut self,
        queue: &Self::Queue,
        kernel: &Self::Kernel,
        global: GlobalSize,
    ) -> ClResult<()>;
    /// Blocking device to host copy.
    fn read_buffer(
        &mut self,
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        out: &mut [f32],
    ) -> ClResult<()>;
}

/// The host's OpenCL runtime, loaded on first use.
#[derive(Debug, Default)]
pub struct OpenCl;

impl Runtime for OpenCl {
    type Platform = Platform;
    type Device = Device;
    type Context = Context;
    type Queue = Queue;
    type Program = Program;
    type Kernel = Kernel;
    type Buffer = Buffer<f32>;

    fn platforms(&mut self) -> ClResult<Vec<Platform>> {
        clrt::init()?;
        let platforms = Platform::all()?;
        for (index, platform) in platforms.iter().enumerate() {
            debug!(
                "Platform {index}: {} ({}), {}",
                platform.name().unwrap_or_default(),
                platform.vendor().unwrap_or_default(),
                platform.version().unwrap_or_default(),
            );
        }
        Ok(platforms)
    }

    fn device_count(&mut self, platform: Platform) -> ClResult<u32> {
        platform.device_count(DeviceType::ALL)
    }

    fn devices(&mut self, platform: Platform, count: u32) -> ClResult<Vec<Device>> {
        let devices = platform.devices(DeviceType::ALL, count)?;
        for (index, device) in devices.iter().enumerate() {
            debug!(
                "Device {index}: {} [{:?}], {} compute units, {} bytes global memory",
                device.name().unwrap_or_default(),
                device.device_type().unwrap_or(DeviceType::empty()),
                device.compute_units().unwrap_or_default(),
                device.global_mem_size().unwrap_or_default(),
            );
        }
        Ok(devices)
    }

    fn create_context(&mut self, devices: &[Device]) -> ClResult<Context> {
        Context::new(devices)
    }

    fn create_queue(&mut self, ctx: &Context, device: Device) -> ClResult<Queue> {
        Queue::new(ctx, device, QueueProperties::empty())
    }

    fn create_program(&mut self, ctx: &Context, source: &str) -> ClResult<Program> {
        Program::from_source(ctx, source)
    }

    fn build_program(&mut self, program: &Program, device: Device) -> ClResult<()> {
        let result = program.build(&[device], "");
        if let Err(err) = result {
            match program.build_log(device) {
                Ok(log) if !log.is_empty() => error!("Program build failed ({err}):\n{log}"),
                _ => error!("Program build failed ({err})"),
            }
        }
        result
    }

    fn create_kernel(&mut self, program: &Program, name: &str) -> ClResult<Kernel> {
        program.kernel(name)
    }

    fn create_buffer(
        &mut self,
        ctx: &Context,
        flags: MemFlags,
        len: usize,
    ) -> ClResult<Buffer<f32>> {
        Buffer::new(ctx, flags, len)
    }

    fn write_buffer(
        &mut self,
        queue: &Queue,
        buffer: &Buffer<f32>,
        data: &[f32],
    ) -> ClResult<()> {
        queue.write(buffer, data)
    }

    fn set_kernel_arg(
        &mut self,
        kernel: &Kernel,
        index: u32,
        buffer: &Buffer<f32>,
    ) -> ClResult<()> {
        kernel.set_arg(index, buffer)
    }

    fn enqueue_kernel(
        &mut self,
        queue: &Queue,
        kernel: &Kernel,
        global: GlobalSize,
    ) -> ClResult<()> {
        queue.launch(kernel, global, None)
    }

    fn read_buffer(
        &mut self,
        queue: &Queue,
        buffer: &Buffer<f32>,
        out: &mut [f32],
    ) -> ClResult<()> {
        queue.read(buffer, out)
    }
}
