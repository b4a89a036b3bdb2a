use crate::DriverError;
use crate::error::narrow_for;
use gpu_registers::map::mmu;
use gpu_registers::{
    AddressPolicy, BlockBase, DeviceAddress, DeviceBase, RegisterBlock, RegisterIo, Strobe,
};

/// Address translation unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MmuController {
    block: BlockBase,
    policy: AddressPolicy,
}

impl MmuController {
    #[must_use]
    pub const fn new(base: DeviceBase, policy: AddressPolicy) -> Self {
        Self {
            block: base.block(RegisterBlock::Mmu),
            policy,
        }
    }

    /// The register value `init` would program for `page_table_base`.
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] if the base does not fit PGTABLE_BASE under
    /// the configured policy.
    pub const fn page_table_register(
        &self,
        page_table_base: DeviceAddress,
    ) -> Result<u32, DriverError> {
        narrow_for("MMU PGTABLE_BASE", page_table_base.as_u64(), self.policy)
    }

    /// Program the page table base, enable translation, then flush the TLB.
    ///
    /// The base goes in before enable and the flush comes after it, so no
    /// cached translation predates the new table. The flush is not awaited.
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] as for [`Self::page_table_register`]; no
    /// register is written in that case.
    pub fn init<R>(&self, io: &mut R, page_table_base: DeviceAddress) -> Result<(), DriverError>
    where
        R: RegisterIo + ?Sized,
    {
        let base = self.page_table_register(page_table_base)?;
        log::debug!("enabling MMU with page table at {page_table_base}");

        super::write(io, self.block.register(mmu::PGTABLE_BASE), "MMU PGTABLE_BASE", base);
        super::strobe(io, self.block.register(mmu::ENABLE), "MMU ENABLE", Strobe::ASSERT);
        super::strobe(io, self.block.register(mmu::FLUSH), "MMU FLUSH", Strobe::ASSERT);
        Ok(())
    }
}
