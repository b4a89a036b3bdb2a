use gpu_registers::map::l2;
use gpu_registers::{BlockBase, DeviceBase, RegisterBlock, RegisterIo, Strobe};

/// L2 cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct L2Controller {
    block: BlockBase,
}

impl L2Controller {
    #[must_use]
    pub const fn new(base: DeviceBase) -> Self {
        Self {
            block: base.block(RegisterBlock::L2),
        }
    }

    /// Enable the cache, then invalidate it. The flush is not awaited.
    pub fn init<R>(&self, io: &mut R)
    where
        R: RegisterIo + ?Sized,
    {
        log::debug!("enabling L2 cache");
        super::strobe(io, self.block.register(l2::ENABLE), "L2 ENABLE", Strobe::ASSERT);
        super::strobe(io, self.block.register(l2::FLUSH), "L2 FLUSH", Strobe::ASSERT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpu_sim::RegisterFile;

    #[test]
    fn enable_then_flush() {
        let block = DeviceBase::default().block(RegisterBlock::L2);
        let mut regs = RegisterFile::new();

        L2Controller::new(DeviceBase::default()).init(&mut regs);

        let writes: Vec<_> = regs.writes().collect();
        assert_eq!(
            writes,
            [(block.register(l2::ENABLE), 1), (block.register(l2::FLUSH), 1)]
        );
    }
}
