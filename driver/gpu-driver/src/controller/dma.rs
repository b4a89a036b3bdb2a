use crate::DriverError;
use crate::error::narrow_for;
use crate::poll::{PollBudget, poll_done};
use gpu_registers::map::dma;
use gpu_registers::{
    AddressPolicy, BlockBase, DeviceAddress, DeviceBase, HostAddress, RegisterBlock, RegisterIo,
    Strobe,
};

/// One DMA descriptor. The engine is direction agnostic; whether `src` and
/// `dst` name host or device memory is up to the caller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DmaTransfer {
    pub src: u64,
    pub dst: u64,
    /// Bytes to move, issued as a single descriptor.
    pub length: usize,
}

impl DmaTransfer {
    #[must_use]
    pub const fn new(src: u64, dst: u64, length: usize) -> Self {
        Self { src, dst, length }
    }

    #[must_use]
    pub const fn to_device(src: HostAddress, dst: DeviceAddress, length: usize) -> Self {
        Self::new(src.as_u64(), dst.as_u64(), length)
    }

    #[must_use]
    pub const fn from_device(src: DeviceAddress, dst: HostAddress, length: usize) -> Self {
        Self::new(src.as_u64(), dst.as_u64(), length)
    }
}

/// Register values of a transfer, narrowed up front.
#[derive(Debug, Copy, Clone)]
struct Programmed {
    src: u32,
    dst: u32,
    len: u32,
}

/// The DMA engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DmaController {
    block: BlockBase,
    policy: AddressPolicy,
}

impl DmaController {
    #[must_use]
    pub const fn new(base: DeviceBase, policy: AddressPolicy) -> Self {
        Self {
            block: base.block(RegisterBlock::Dma),
            policy,
        }
    }

    /// Program SRC, DST and LEN, write START, then spin on DONE.
    ///
    /// Synchronous: the transfer has finished when this returns. A DMA
    /// engine that never signals DONE hangs the caller.
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] if an address or the length does not fit
    /// its register; nothing is written in that case.
    pub fn copy<R>(&self, io: &mut R, transfer: DmaTransfer) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        self.copy_bounded(io, transfer, PollBudget::Unbounded)
    }

    /// Like [`Self::copy`], but stops polling once `budget` is spent.
    ///
    /// On timeout the transfer may still be in flight; the engine's registers
    /// must not be reprogrammed until [`Self::drain`] has observed DONE.
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] as for [`Self::copy`];
    /// [`DriverError::Timeout`] if DONE stayed zero for the whole budget.
    pub fn copy_bounded<R>(
        &self,
        io: &mut R,
        transfer: DmaTransfer,
        budget: PollBudget,
    ) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        let programmed = self.program(transfer)?;
        self.start(io, transfer, programmed);
        self.drain(io, budget)
    }

    /// Poll DONE of a transfer that was already started, without touching
    /// any other register.
    ///
    /// # Errors
    /// [`DriverError::Timeout`] if DONE stayed zero for the whole budget.
    pub fn drain<R>(&self, io: &mut R, budget: PollBudget) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        match poll_done(io, self.block.register(dma::DONE), budget) {
            Ok(reads) => {
                log::trace!("DMA done after {reads} polls");
                Ok(())
            }
            Err(polls) => {
                log::warn!("DMA still busy after {polls} polls");
                Err(DriverError::Timeout {
                    register: "DMA DONE",
                    polls,
                })
            }
        }
    }

    const fn program(&self, transfer: DmaTransfer) -> Result<Programmed, DriverError> {
        let src = match narrow_for("DMA SRC", transfer.src, self.policy) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        let dst = match narrow_for("DMA DST", transfer.dst, self.policy) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        let len = match narrow_for("DMA LEN", transfer.length as u64, self.policy) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        Ok(Programmed { src, dst, len })
    }

    fn start<R>(&self, io: &mut R, transfer: DmaTransfer, programmed: Programmed)
    where
        R: RegisterIo + ?Sized,
    {
        log::debug!(
            "DMA {:#x} -> {:#x}, {} bytes",
            transfer.src,
            transfer.dst,
            transfer.length
        );

        super::write(io, self.block.register(dma::SRC), "DMA SRC", programmed.src);
        super::write(io, self.block.register(dma::DST), "DMA DST", programmed.dst);
        super::write(io, self.block.register(dma::LEN), "DMA LEN", programmed.len);
        super::strobe(io, self.block.register(dma::START), "DMA START", Strobe::ASSERT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpu_sim::{Access, RegisterFile};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn block() -> BlockBase {
        DeviceBase::default().block(RegisterBlock::Dma)
    }

    fn controller() -> DmaController {
        DmaController::new(DeviceBase::default(), AddressPolicy::Strict)
    }

    #[test]
    fn copy_programs_then_polls() {
        let done = block().register(dma::DONE);
        let mut regs = RegisterFile::new();
        regs.complete_after(done, 3);

        controller()
            .copy(&mut regs, DmaTransfer::new(0x1000, 0x2000, 64))
            .unwrap();

        let write = |offset, value| Access::Write {
            address: block().register(offset),
            value,
        };
        let read = |value| Access::Read { address: done, value };
        assert_eq!(
            regs.trace(),
            &[
                write(dma::SRC, 0x1000),
                write(dma::DST, 0x2000),
                write(dma::LEN, 64),
                write(dma::START, 1),
                read(0),
                read(0),
                read(1),
            ]
        );
    }

    #[test]
    fn copy_does_not_return_while_done_is_zero() {
        let mut regs = RegisterFile::new().with_read_budget(1_000);

        let result = catch_unwind(AssertUnwindSafe(|| {
            controller().copy(&mut regs, DmaTransfer::new(0x1000, 0x2000, 64))
        }));

        assert!(result.is_err(), "copy returned without DONE");
        assert_eq!(regs.reads_of(block().register(dma::DONE)), 1_000);
    }

    #[test]
    fn copy_bounded_reports_timeout() {
        let mut regs = RegisterFile::new();
        let err = controller()
            .copy_bounded(
                &mut regs,
                DmaTransfer::new(0x1000, 0x2000, 64),
                PollBudget::attempts(8),
            )
            .unwrap_err();

        assert_eq!(
            err,
            DriverError::Timeout {
                register: "DMA DONE",
                polls: 8
            }
        );
        assert_eq!(regs.writes().count(), 4);
    }

    #[test]
    fn drain_only_polls_done() {
        let done = block().register(dma::DONE);
        let mut regs = RegisterFile::new();
        regs.complete_after(done, 5);

        assert_eq!(
            controller().drain(&mut regs, PollBudget::attempts(2)),
            Err(DriverError::Timeout {
                register: "DMA DONE",
                polls: 2
            })
        );
        assert_eq!(controller().drain(&mut regs, PollBudget::Unbounded), Ok(()));

        assert_eq!(regs.writes().count(), 0);
        assert_eq!(regs.reads_of(done), 5);
    }

    #[test]
    fn oversized_length_is_rejected_up_front() {
        let mut regs = RegisterFile::new();
        let err = controller()
            .copy(&mut regs, DmaTransfer::new(0x1000, 0x2000, 1 << 33))
            .unwrap_err();

        assert!(matches!(err, DriverError::Narrowing { register: "DMA LEN", .. }));
        assert!(regs.trace().is_empty());
    }
}
