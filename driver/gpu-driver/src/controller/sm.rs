use crate::error::narrow_for;
use crate::poll::{PollBudget, poll_done};
use crate::{DriverError, KernelDescriptor};
use gpu_registers::map::sm;
use gpu_registers::{AddressPolicy, BlockBase, DeviceBase, RegisterBlock, RegisterIo, Strobe};

/// Streaming multiprocessors: power-on, kernel launch and completion.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SmController {
    block: BlockBase,
    policy: AddressPolicy,
}

impl SmController {
    #[must_use]
    pub const fn new(base: DeviceBase, policy: AddressPolicy) -> Self {
        Self {
            block: base.block(RegisterBlock::Sm),
            policy,
        }
    }

    /// Power on the compute units. Translation and caching must already be
    /// live; kernels may access memory as soon as they are dispatched.
    pub fn enable<R>(&self, io: &mut R)
    where
        R: RegisterIo + ?Sized,
    {
        log::debug!("enabling SMs");
        super::strobe(io, self.block.register(sm::ENABLE), "SM ENABLE", Strobe::ASSERT);
    }

    /// Program KERNEL_ADDR, ARG_ADDR, GRID_DIM and BLOCK_DIM, then write START.
    ///
    /// The device latches all four parameters on START, so START is always
    /// the last write. Does not wait for completion, see [`Self::wait`].
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] if either address does not fit its register;
    /// nothing is written in that case.
    pub fn launch<R>(&self, io: &mut R, kernel: &KernelDescriptor) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        let entry = narrow_for("SM KERNEL_ADDR", kernel.entry_point.as_u64(), self.policy)?;
        let args = narrow_for("SM ARG_ADDR", kernel.arg_ptr.as_u64(), self.policy)?;

        log::debug!(
            "launching kernel at {} (args {}), grid={} block={}",
            kernel.entry_point,
            kernel.arg_ptr,
            kernel.grid_x,
            kernel.block_x
        );

        super::write(io, self.block.register(sm::KERNEL_ADDR), "SM KERNEL_ADDR", entry);
        super::write(io, self.block.register(sm::ARG_ADDR), "SM ARG_ADDR", args);
        super::write(io, self.block.register(sm::GRID_DIM), "SM GRID_DIM", kernel.grid_x);
        super::write(io, self.block.register(sm::BLOCK_DIM), "SM BLOCK_DIM", kernel.block_x);
        super::strobe(io, self.block.register(sm::START), "SM START", Strobe::ASSERT);
        Ok(())
    }

    /// Spin on DONE until it reads nonzero. Never times out.
    pub fn wait<R>(&self, io: &mut R)
    where
        R: RegisterIo + ?Sized,
    {
        let done = self.block.register(sm::DONE);
        // Unbounded polls only return once DONE is observed.
        let (Ok(reads) | Err(reads)) = poll_done(io, done, PollBudget::Unbounded);
        log::debug!("kernel done after {reads} polls");
    }

    /// Like [`Self::wait`], but gives up once `budget` is spent.
    ///
    /// # Errors
    /// [`DriverError::Timeout`] if DONE stayed zero for the whole budget.
    pub fn wait_bounded<R>(&self, io: &mut R, budget: PollBudget) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        match poll_done(io, self.block.register(sm::DONE), budget) {
            Ok(reads) => {
                log::debug!("kernel done after {reads} polls");
                Ok(())
            }
            Err(polls) => {
                log::warn!("kernel still running after {polls} polls");
                Err(DriverError::Timeout {
                    register: "SM DONE",
                    polls,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpu_registers::DeviceAddress;
    use gpu_sim::{Access, RegisterFile};

    fn block() -> BlockBase {
        DeviceBase::default().block(RegisterBlock::Sm)
    }

    fn controller() -> SmController {
        SmController::new(DeviceBase::default(), AddressPolicy::Strict)
    }

    fn descriptor() -> KernelDescriptor {
        KernelDescriptor::new(
            DeviceAddress::new(0xA000_0000),
            DeviceAddress::new(0xA100_0000),
            4,
            64,
        )
    }

    #[test]
    fn launch_writes_parameters_before_start() {
        let mut regs = RegisterFile::new();
        controller().launch(&mut regs, &descriptor()).unwrap();

        let writes: Vec<_> = regs.writes().collect();
        assert_eq!(
            writes,
            [
                (block().register(sm::KERNEL_ADDR), 0xA000_0000),
                (block().register(sm::ARG_ADDR), 0xA100_0000),
                (block().register(sm::GRID_DIM), 4),
                (block().register(sm::BLOCK_DIM), 64),
                (block().register(sm::START), 1),
            ]
        );
    }

    #[test]
    fn launch_rejects_wide_arg_pointer_without_writing() {
        let mut regs = RegisterFile::new();
        let mut kd = descriptor();
        kd.arg_ptr = DeviceAddress::new(0x2_A100_0000);

        let err = controller().launch(&mut regs, &kd).unwrap_err();
        assert!(matches!(err, DriverError::Narrowing { register: "SM ARG_ADDR", .. }));
        assert!(regs.trace().is_empty());
    }

    #[test]
    fn enable_writes_one() {
        let mut regs = RegisterFile::new();
        controller().enable(&mut regs);
        assert_eq!(
            regs.trace(),
            &[Access::Write {
                address: block().register(sm::ENABLE),
                value: 1
            }]
        );
    }

    #[test]
    fn wait_polls_done_until_nonzero() {
        let done = block().register(sm::DONE);
        let mut regs = RegisterFile::new();
        regs.complete_after(done, 4);

        controller().wait(&mut regs);

        assert_eq!(regs.reads_of(done), 4);
        assert_eq!(regs.writes().count(), 0);
    }

    #[test]
    fn wait_bounded_times_out() {
        let mut regs = RegisterFile::new();
        let err = controller().wait_bounded(&mut regs, PollBudget::attempts(10)).unwrap_err();
        assert_eq!(
            err,
            DriverError::Timeout {
                register: "SM DONE",
                polls: 10
            }
        );
    }
}
