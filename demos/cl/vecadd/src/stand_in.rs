//! A scripted runtime for exercising the probe without an OpenCL installation.
//!
//! Every call is recorded. Buffers hold real host memory and the `add` kernel is emulated,
//! so results can be checked end to end. Misuse (reading before a dispatch, dispatching
//! with unbound arguments, binding an input that was never written) panics.

use clrt::prelude::*;

use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Platforms,
    DeviceCount,
    Devices,
    CreateContext,
    CreateQueue,
    CreateProgram,
    BuildProgram,
    CreateKernel,
    CreateBuffer,
    WriteBuffer,
    SetKernelArg,
    EnqueueKernel,
    ReadBuffer,
}

#[derive(Debug)]
pub struct StandInBuffer {
    pub flags: MemFlags,
    pub len: usize,
    data: Vec<f32>,
    written: bool,
}

#[derive(Debug, Default)]
pub struct StandIn {
    devices_per_platform: Vec<usize>,
    failure: Option<(Call, usize, i32)>,
    calls: Vec<Call>,
    buffers: Vec<StandInBuffer>,
    args: [Option<usize>; 3],
    context_devices: Option<Vec<(usize, usize)>>,
    queue_device: Option<(usize, usize)>,
    kernel_name: Option<String>,
    global: Option<GlobalSize>,
    dispatched: bool,
}

impl StandIn {
    /// One platform per entry, each exposing that many devices.
    pub fn new(devices_per_platform: &[usize]) -> Self {
        StandIn {
            devices_per_platform: devices_per_platform.to_vec(),
            ..Default::default()
        }
    }

    /// Make the `nth` (zero-based) occurrence of `call` fail with `code`.
    pub fn fail_at(mut self, call: Call, nth: usize, code: i32) -> Self {
        self.failure = Some((call, nth, code));
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn buffers(&self) -> &[StandInBuffer] {
        &self.buffers
    }

    /// Buffer indices bound to kernel parameters 0, 1 and 2.
    pub fn kernel_args(&self) -> [Option<usize>; 3] {
        self.args
    }

    pub fn context_devices(&self) -> Option<Vec<(usize, usize)>> {
        self.context_devices.clone()
    }

    pub fn queue_device(&self) -> Option<(usize, usize)> {
        self.queue_device
    }

    pub fn kernel_name(&self) -> Option<&str> {
        self.kernel_name.as_deref()
    }

    pub fn global_size(&self) -> Option<GlobalSize> {
        self.global
    }

    fn enter(&mut self, call: Call) -> ClResult<()> {
        let nth = self.calls.iter().filter(|c| **c == call).count();
        self.calls.push(call);
        match self.failure {
            Some((failing, at, code)) if failing == call && at == nth => {
                Err(ClError::from_code(code))
            }
            _ => Ok(()),
        }
    }
}

impl Runtime for StandIn {
    type Platform = usize;
    type Device = (usize, usize);
    type Context = ();
    type Queue = ();
    type Program = ();
    type Kernel = ();
    type Buffer = usize;

    fn platforms(&mut self) -> ClResult<Vec<usize>> {
        self.enter(Call::Platforms)?;
        Ok((0..self.devices_per_platform.len()).collect())
    }

    fn device_count(&mut self, platform: usize) -> ClResult<u32> {
        self.enter(Call::DeviceCount)?;
        Ok(self.devices_per_platform[platform] as u32)
    }

    fn devices(&mut self, platform: usize, count: u32) -> ClResult<Vec<(usize, usize)>> {
        self.enter(Call::Devices)?;
        assert_eq!(count as usize, self.devices_per_platform[platform]);
        Ok((0..count as usize).map(|device| (platform, device)).collect())
    }

    fn create_context(&mut self, devices: &[(usize, usize)]) -> ClResult<()> {
        self.enter(Call::CreateContext)?;
        assert!(!devices.is_empty(), "context created without devices");
        self.context_devices = Some(devices.to_vec());
        Ok(())
    }

    fn create_queue(&mut self, _ctx: &(), device: (usize, usize)) -> ClResult<()> {
        self.enter(Call::CreateQueue)?;
        self.queue_device = Some(device);
        Ok(())
    }

    fn create_program(&mut self, _ctx: &(), source: &str) -> ClResult<()> {
        self.enter(Call::CreateProgram)?;
        assert!(!source.is_empty());
        Ok(())
    }

    fn build_program(&mut self, _program: &(), _device: (usize, usize)) -> ClResult<()> {
        self.enter(Call::BuildProgram)
    }

    fn create_kernel(&mut self, _program: &(), name: &str) -> ClResult<()> {
        self.enter(Call::CreateKernel)?;
        self.kernel_name = Some(name.to_owned());
        Ok(())
    }

    fn create_buffer(&mut self, _ctx: &(), flags: MemFlags, len: usize) -> ClResult<usize> {
        self.enter(Call::CreateBuffer)?;
        self.buffers.push(StandInBuffer {
            flags,
            len,
            data: vec![0.0; len],
            written: false,
        });
        Ok(self.buffers.len() - 1)
    }

    fn write_buffer(&mut self, _queue: &(), buffer: &usize, data: &[f32]) -> ClResult<()> {
        self.enter(Call::WriteBuffer)?;
        let buffer = &mut self.buffers[*buffer];
        assert!(data.len() <= buffer.len, "write past the end of a buffer");
        buffer.data[..data.len()].copy_from_slice(data);
        buffer.written = true;
        Ok(())
    }

    fn set_kernel_arg(&mut self, _kernel: &(), index: u32, buffer: &usize) -> ClResult<()> {
        self.enter(Call::SetKernelArg)?;
        let bound = &self.buffers[*buffer];
        if bound.flags.contains(MemFlags::READ_ONLY) {
            assert!(bound.written, "input buffer {buffer} bound before it was written");
        }
        self.args[index as usize] = Some(*buffer);
        Ok(())
    }

    fn enqueue_kernel(&mut self, _queue: &(), _kernel: &(), global: GlobalSize) -> ClResult<()> {
        self.enter(Call::EnqueueKernel)?;
        let [Some(c), Some(b), Some(a)] = self.args else {
            panic!("kernel dispatched with unbound arguments: {:?}", self.args);
        };
        assert!(self.buffers[a].written && self.buffers[b].written);

        let sums: Vec<f32> = (0..global.count())
            .map(|i| self.buffers[a].data[i] + self.buffers[b].data[i])
            .collect();
        self.buffers[c].data[..sums.len()].copy_from_slice(&sums);
        self.global = Some(global);
        self.dispatched = true;
        Ok(())
    }

    fn read_buffer(&mut self, _queue: &(), buffer: &usize, out: &mut [f32]) -> ClResult<()> {
        self.enter(Call::ReadBuffer)?;
        assert!(self.dispatched, "buffer read before the kernel was dispatched");
        let data = &self.buffers[*buffer].data;
        out.copy_from_slice(&data[..out.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic(expected = "buffer read before the kernel was dispatched")]
    fn reading_before_dispatch_panics() {
        let mut rt = StandIn::new(&[1]);
        let c = rt.create_buffer(&(), MemFlags::WRITE_ONLY, 4).unwrap();
        let mut out = [0.0f32; 4];
        let _ = rt.read_buffer(&(), &c, &mut out);
    }

    #[test]
    #[should_panic(expected = "bound before it was written")]
    fn binding_an_unwritten_input_panics() {
        let mut rt = StandIn::new(&[1]);
        let a = rt.create_buffer(&(), MemFlags::READ_ONLY, 4).unwrap();
        let _ = rt.set_kernel_arg(&(), 2, &a);
    }

    #[test]
    #[should_panic(expected = "kernel dispatched with unbound arguments")]
    fn dispatching_with_unbound_arguments_panics() {
        let mut rt = StandIn::new(&[1]);
        let c = rt.create_buffer(&(), MemFlags::WRITE_ONLY, 4).unwrap();
        rt.set_kernel_arg(&(), 0, &c).unwrap();
        let _ = rt.enqueue_kernel(&(), &(), GlobalSize::x(4));
    }

    #[test]
    fn in_order_use_adds_the_inputs() {
        let mut rt = StandIn::new(&[1]);
        let a = rt.create_buffer(&(), MemFlags::READ_ONLY, 3).unwrap();
        let b = rt.create_buffer(&(), MemFlags::READ_ONLY, 3).unwrap();
        let c = rt.create_buffer(&(), MemFlags::WRITE_ONLY, 3).unwrap();
        rt.write_buffer(&(), &a, &[1.0, 2.0, 3.0]).unwrap();
        rt.write_buffer(&(), &b, &[10.0, 20.0, 30.0]).unwrap();
        rt.set_kernel_arg(&(), 0, &c).unwrap();
        rt.set_kernel_arg(&(), 1, &b).unwrap();
        rt.set_kernel_arg(&(), 2, &a).unwrap();
        rt.enqueue_kernel(&(), &(), GlobalSize::x(3)).unwrap();

        let mut out = [0.0f32; 3];
        rt.read_buffer(&(), &c, &mut out).unwrap();
        assert_eq!(out, [11.0, 22.0, 33.0]);
    }
}
