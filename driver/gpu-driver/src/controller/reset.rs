use core::hint::{black_box, spin_loop};
use gpu_registers::map::control;
use gpu_registers::{BlockBase, DeviceBase, RegisterBlock, RegisterIo, Strobe};

/// Global reset through the control block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResetController {
    block: BlockBase,
}

impl ResetController {
    #[must_use]
    pub const fn new(base: DeviceBase) -> Self {
        Self {
            block: base.block(RegisterBlock::Control),
        }
    }

    /// Assert RESET, spin for `hold_cycles`, deassert.
    ///
    /// No reset-complete signal exists; the delay issues no register traffic
    /// and is only "usually long enough".
    pub fn reset<R>(&self, io: &mut R, hold_cycles: u32)
    where
        R: RegisterIo + ?Sized,
    {
        let reset = self.block.register(control::RESET);
        log::debug!("asserting reset for {hold_cycles} cycles");

        super::strobe(io, reset, "RESET", Strobe::ASSERT);
        // Keep the count opaque; `spin_loop` compiles to nothing on some targets.
        for cycle in 0..black_box(hold_cycles) {
            black_box(cycle);
            spin_loop();
        }
        super::strobe(io, reset, "RESET", Strobe::DEASSERT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpu_sim::{Access, RegisterFile};

    #[test]
    fn reset_is_assert_then_deassert() {
        let base = DeviceBase::default();
        let reset = base.block(RegisterBlock::Control).register(control::RESET);
        let mut regs = RegisterFile::new();

        ResetController::new(base).reset(&mut regs, 100);

        assert_eq!(
            regs.trace(),
            &[
                Access::Write {
                    address: reset,
                    value: 1
                },
                Access::Write {
                    address: reset,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn repeated_resets_are_not_merged() {
        let base = DeviceBase::default();
        let mut regs = RegisterFile::new();
        let ctrl = ResetController::new(base);

        ctrl.reset(&mut regs, 0);
        ctrl.reset(&mut regs, 0);

        let values: Vec<u32> = regs.writes().map(|(_, v)| v).collect();
        assert_eq!(values, [1, 0, 1, 0]);
    }
}
