use crate::{Memory, RegisterFile};
use gpu_registers::map::{control, dma, sm};
use gpu_registers::{BlockBase, DeviceBase, RegisterAddress, RegisterBlock, RegisterIo};
use log::{debug, trace};

/// Kernel parameters latched by the simulated SM block on START.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LaunchParams {
    pub entry_point: u32,
    pub arg_ptr: u32,
    pub grid_x: u32,
    pub block_x: u32,
}

/// A transfer the simulated DMA engine performed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DmaRecord {
    pub src: u32,
    pub dst: u32,
    pub len: u32,
}

/// Host-side implementation of a "kernel": runs synchronously on SM START.
pub type KernelFn = Box<dyn FnMut(&LaunchParams, &mut Memory) + Send>;

/// Behavioral model of the accelerator behind a [`RegisterFile`].
///
/// - RESET=1 returns every register to zero.
/// - DMA START copies LEN bytes from SRC to DST in [`Memory`] and raises DMA
///   DONE after the configured number of polls.
/// - SM START runs the installed kernel (if any) and raises SM DONE after the
///   configured number of polls.
/// - Writing START clears the corresponding DONE first.
pub struct SimulatedDevice {
    regs: RegisterFile,
    memory: Memory,
    base: DeviceBase,
    control: BlockBase,
    sm: BlockBase,
    dma: BlockBase,
    dma_latency: u32,
    kernel_latency: u32,
    dma_stalled: bool,
    sm_stalled: bool,
    kernel: Option<KernelFn>,
    transfers: Vec<DmaRecord>,
    launches: Vec<LaunchParams>,
}

impl core::fmt::Debug for SimulatedDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedDevice")
            .field("base", &format_args!("{:#x}", self.base.as_u64()))
            .field("transfers", &self.transfers.len())
            .field("launches", &self.launches.len())
            .field("kernel", &self.kernel.is_some())
            .finish_non_exhaustive()
    }
}

impl SimulatedDevice {
    #[must_use]
    pub fn new(base: DeviceBase) -> Self {
        Self::with_registers(base, RegisterFile::new())
    }

    /// Model a device on top of a pre-configured register file, e.g. one
    /// with a read budget.
    #[must_use]
    pub fn with_registers(base: DeviceBase, regs: RegisterFile) -> Self {
        Self {
            regs,
            memory: Memory::new(),
            base,
            control: base.block(RegisterBlock::Control),
            sm: base.block(RegisterBlock::Sm),
            dma: base.block(RegisterBlock::Dma),
            dma_latency: 1,
            kernel_latency: 1,
            dma_stalled: false,
            sm_stalled: false,
            kernel: None,
            transfers: Vec::new(),
            launches: Vec::new(),
        }
    }

    /// DMA DONE reads nonzero on the `polls`-th poll after START.
    #[must_use]
    pub fn with_dma_latency(mut self, polls: u32) -> Self {
        self.dma_latency = polls;
        self
    }

    /// SM DONE reads nonzero on the `polls`-th poll after START.
    #[must_use]
    pub fn with_kernel_latency(mut self, polls: u32) -> Self {
        self.kernel_latency = polls;
        self
    }

    /// Install the host closure that plays the kernel.
    #[must_use]
    pub fn with_kernel(
        mut self,
        kernel: impl FnMut(&LaunchParams, &mut Memory) + Send + 'static,
    ) -> Self {
        self.kernel = Some(Box::new(kernel));
        self
    }

    /// Never raise DMA DONE again.
    pub fn stall_dma(&mut self) {
        self.dma_stalled = true;
        self.regs.stall(self.dma.register(dma::DONE));
    }

    /// Never raise SM DONE again.
    pub fn stall_sm(&mut self) {
        self.sm_stalled = true;
        self.regs.stall(self.sm.register(sm::DONE));
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Transfers performed so far.
    #[must_use]
    pub fn transfers(&self) -> &[DmaRecord] {
        &self.transfers
    }

    /// Launches observed so far.
    #[must_use]
    pub fn launches(&self) -> &[LaunchParams] {
        &self.launches
    }

    fn on_reset(&mut self, value: u32) {
        if value != 0 {
            debug!("reset asserted; registers return to power-on state");
            let reset = self.control.register(control::RESET);
            self.regs.clear_values();
            self.regs.set(reset, value);
            if self.dma_stalled {
                self.regs.stall(self.dma.register(dma::DONE));
            }
            if self.sm_stalled {
                self.regs.stall(self.sm.register(sm::DONE));
            }
        }
    }

    fn on_dma_start(&mut self) {
        let record = DmaRecord {
            src: self.regs.get(self.dma.register(dma::SRC)),
            dst: self.regs.get(self.dma.register(dma::DST)),
            len: self.regs.get(self.dma.register(dma::LEN)),
        };
        debug!("DMA {:#x} -> {:#x}, {} bytes", record.src, record.dst, record.len);

        self.memory
            .copy(u64::from(record.src), u64::from(record.dst), record.len as usize);
        self.transfers.push(record);
        self.arm_done(self.dma.register(dma::DONE), self.dma_stalled, self.dma_latency);
    }

    fn on_sm_start(&mut self) {
        let params = LaunchParams {
            entry_point: self.regs.get(self.sm.register(sm::KERNEL_ADDR)),
            arg_ptr: self.regs.get(self.sm.register(sm::ARG_ADDR)),
            grid_x: self.regs.get(self.sm.register(sm::GRID_DIM)),
            block_x: self.regs.get(self.sm.register(sm::BLOCK_DIM)),
        };
        debug!(
            "kernel {:#x} (args {:#x}) grid={} block={}",
            params.entry_point, params.arg_ptr, params.grid_x, params.block_x
        );

        if let Some(kernel) = self.kernel.as_mut() {
            kernel(&params, &mut self.memory);
        }
        self.launches.push(params);
        self.arm_done(self.sm.register(sm::DONE), self.sm_stalled, self.kernel_latency);
    }

    fn arm_done(&mut self, done: RegisterAddress, stalled: bool, latency: u32) {
        if stalled {
            self.regs.stall(done);
        } else {
            self.regs.complete_after(done, latency);
        }
    }
}

impl RegisterIo for SimulatedDevice {
    fn read(&mut self, address: RegisterAddress) -> u32 {
        self.regs.read(address)
    }

    fn write(&mut self, address: RegisterAddress, value: u32) {
        match self.base.locate(address) {
            Some((block, offset)) => trace!("sim write {}+{offset:#x} <- {value:#x}", block.name()),
            None => trace!("sim write {address} (unmapped) <- {value:#x}"),
        }
        self.regs.write(address, value);

        if address == self.control.register(control::RESET) {
            self.on_reset(value);
        } else if address == self.dma.register(dma::START) && value != 0 {
            self.on_dma_start();
        } else if address == self.sm.register(sm::START) && value != 0 {
            self.on_sm_start();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DeviceBase {
        DeviceBase::default()
    }

    #[test]
    fn dma_start_moves_bytes_and_raises_done() {
        let dma_block = base().block(RegisterBlock::Dma);
        let mut dev = SimulatedDevice::new(base()).with_dma_latency(2);
        dev.memory_mut().write_u32s(0x1000, &[10, 20, 30, 40]);

        dev.write(dma_block.register(dma::SRC), 0x1000);
        dev.write(dma_block.register(dma::DST), 0xA100_0000);
        dev.write(dma_block.register(dma::LEN), 16);
        dev.write(dma_block.register(dma::START), 1);

        let done = dma_block.register(dma::DONE);
        assert_eq!(dev.read(done), 0);
        assert_eq!(dev.read(done), 1);
        assert_eq!(dev.memory().read_u32s(0xA100_0000, 4), [10, 20, 30, 40]);
        assert_eq!(
            dev.transfers(),
            &[DmaRecord {
                src: 0x1000,
                dst: 0xA100_0000,
                len: 16
            }]
        );
    }

    #[test]
    fn sm_start_runs_kernel_with_latched_params() {
        let sm_block = base().block(RegisterBlock::Sm);
        let mut dev = SimulatedDevice::new(base()).with_kernel(|p, mem| {
            mem.write_u32s(u64::from(p.arg_ptr), &[p.grid_x * p.block_x]);
        });

        dev.write(sm_block.register(sm::KERNEL_ADDR), 0xA000_0000);
        dev.write(sm_block.register(sm::ARG_ADDR), 0xA100_0000);
        dev.write(sm_block.register(sm::GRID_DIM), 4);
        dev.write(sm_block.register(sm::BLOCK_DIM), 64);
        dev.write(sm_block.register(sm::START), 1);

        assert_eq!(dev.read(sm_block.register(sm::DONE)), 1);
        assert_eq!(dev.memory().read_u32s(0xA100_0000, 1), [256]);
        assert_eq!(dev.launches().len(), 1);
        assert_eq!(dev.launches()[0].entry_point, 0xA000_0000);
    }

    #[test]
    fn reset_clears_registers() {
        let b = base();
        let mmu_enable = b.block(RegisterBlock::Mmu).register(0);
        let mut dev = SimulatedDevice::new(b);

        dev.write(mmu_enable, 1);
        dev.write(b.block(RegisterBlock::Control).register(control::RESET), 1);
        assert_eq!(dev.registers().get(mmu_enable), 0);
    }

    #[test]
    fn stalled_dma_never_completes() {
        let dma_block = base().block(RegisterBlock::Dma);
        let mut dev = SimulatedDevice::new(base());
        dev.stall_dma();
        dev.write(dma_block.register(dma::START), 1);
        for _ in 0..100 {
            assert_eq!(dev.read(dma_block.register(dma::DONE)), 0);
        }
    }
}
