//! # Register Map
//!
//! Block bases and per-block register offsets. All registers are 32 bits
//! wide and accessed in host byte order.

use core::fmt;

/// Default physical base of the MMIO window.
pub const DEFAULT_DEVICE_BASE: u64 = 0x8000_0000;

/// Size of the MMIO window; the interrupt block is the last one.
pub const WINDOW_SIZE: u64 = 0xB000;

/// Absolute address of one 32-bit register.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegisterAddress(u64);

impl RegisterAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn as_ptr(self) -> *mut u32 {
        self.0 as *mut u32
    }
}

impl fmt::Debug for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegisterAddress({:#x})", self.0)
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The register blocks of the device, one per subsystem.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RegisterBlock {
    Control,
    Mmu,
    L2,
    Sm,
    Dma,
    Interrupt,
}

impl RegisterBlock {
    pub const ALL: [Self; 6] = [
        Self::Control,
        Self::Mmu,
        Self::L2,
        Self::Sm,
        Self::Dma,
        Self::Interrupt,
    ];

    /// Offset of the block from the device base.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u64 {
        match self {
            Self::Control => 0x0000,
            Self::Mmu => 0x1000,
            Self::L2 => 0x2000,
            Self::Sm => 0x4000,
            Self::Dma => 0x8000,
            Self::Interrupt => 0xA000,
        }
    }

    /// Number of bytes of register space the block decodes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> u64 {
        match self {
            Self::Control => control::SPAN,
            Self::Mmu => mmu::SPAN,
            Self::L2 => l2::SPAN,
            Self::Sm => sm::SPAN,
            Self::Dma => dma::SPAN,
            Self::Interrupt => interrupt::SPAN,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Mmu => "mmu",
            Self::L2 => "l2",
            Self::Sm => "sm",
            Self::Dma => "dma",
            Self::Interrupt => "interrupt",
        }
    }
}

/// Physical base of the device's MMIO window.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeviceBase(u64);

impl Default for DeviceBase {
    fn default() -> Self {
        Self(DEFAULT_DEVICE_BASE)
    }
}

impl DeviceBase {
    #[inline]
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self(base)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn block(self, block: RegisterBlock) -> BlockBase {
        BlockBase {
            block,
            base: self.0 + block.offset(),
        }
    }

    /// The block decoding `address` and the register's offset within it.
    #[must_use]
    pub fn locate(self, address: RegisterAddress) -> Option<(RegisterBlock, u64)> {
        RegisterBlock::ALL
            .into_iter()
            .map(|block| self.block(block))
            .find(|block| block.contains(address))
            .map(|block| (block.block(), address.0 - block.base))
    }
}

/// Base address of one register block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlockBase {
    block: RegisterBlock,
    base: u64,
}

impl BlockBase {
    #[inline]
    #[must_use]
    pub const fn block(self) -> RegisterBlock {
        self.block
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.base
    }

    /// Absolute address of the register at `offset` within this block.
    #[inline]
    #[must_use]
    pub const fn register(self, offset: u64) -> RegisterAddress {
        debug_assert!(offset < self.block.size());
        debug_assert!(offset.is_multiple_of(4));
        RegisterAddress(self.base + offset)
    }

    /// Whether `address` falls inside this block.
    #[inline]
    #[must_use]
    pub const fn contains(self, address: RegisterAddress) -> bool {
        address.0 >= self.base && address.0 < self.base + self.block.size()
    }
}

/// Global control block.
pub mod control {
    /// Write 1 to assert reset, 0 to deassert.
    pub const RESET: u64 = 0x00;
    /// Read-only status; not consumed by the driver.
    pub const STATUS: u64 = 0x04;
    /// Generic start; not consumed by the driver.
    pub const START: u64 = 0x08;
    /// Generic done; not consumed by the driver.
    pub const DONE: u64 = 0x0C;
    pub(crate) const SPAN: u64 = 0x10;
}

/// MMU / TLB block.
pub mod mmu {
    /// Write 1 to enable translation.
    pub const ENABLE: u64 = 0x00;
    /// Page table physical base (32-bit).
    pub const PGTABLE_BASE: u64 = 0x04;
    /// Write 1 to invalidate the TLB.
    pub const FLUSH: u64 = 0x08;
    pub(crate) const SPAN: u64 = 0x0C;
}

/// L2 cache block.
pub mod l2 {
    /// Write 1 to enable the cache.
    pub const ENABLE: u64 = 0x00;
    /// Write 1 to invalidate the cache.
    pub const FLUSH: u64 = 0x04;
    pub(crate) const SPAN: u64 = 0x08;
}

/// Streaming-multiprocessor block.
pub mod sm {
    /// Write 1 to power on the compute units.
    pub const ENABLE: u64 = 0x00;
    /// Warp configuration; not programmed by the driver.
    pub const WARP_CFG: u64 = 0x04;
    /// Launch configuration; not programmed by the driver.
    pub const LAUNCH_CFG: u64 = 0x08;
    /// Kernel entry point (device address).
    pub const KERNEL_ADDR: u64 = 0x0C;
    /// Kernel argument pointer (device address).
    pub const ARG_ADDR: u64 = 0x10;
    /// Grid dimension (x).
    pub const GRID_DIM: u64 = 0x14;
    /// Block dimension (x).
    pub const BLOCK_DIM: u64 = 0x18;
    /// Write 1 to launch; parameters are latched on this write.
    pub const START: u64 = 0x1C;
    /// Reads nonzero once the kernel finished.
    pub const DONE: u64 = 0x20;
    pub(crate) const SPAN: u64 = 0x24;
}

/// DMA engine block.
pub mod dma {
    /// Source address.
    pub const SRC: u64 = 0x00;
    /// Destination address.
    pub const DST: u64 = 0x04;
    /// Transfer length in bytes.
    pub const LEN: u64 = 0x08;
    /// Write 1 to begin the transfer.
    pub const START: u64 = 0x0C;
    /// Reads nonzero once the transfer finished.
    pub const DONE: u64 = 0x10;
    pub(crate) const SPAN: u64 = 0x14;
}

/// Interrupt block. Present in the map, not used by the polling driver.
pub mod interrupt {
    pub const STATUS: u64 = 0x00;
    pub const CLEAR: u64 = 0x04;
    pub(crate) const SPAN: u64 = 0x08;
}

const _: () = {
    let mut i = 1;
    while i < RegisterBlock::ALL.len() {
        let prev = RegisterBlock::ALL[i - 1];
        let next = RegisterBlock::ALL[i];
        assert!(prev.offset() + prev.size() <= next.offset());
        i += 1;
    }
    let last = RegisterBlock::ALL[RegisterBlock::ALL.len() - 1];
    assert!(last.offset() + last.size() <= WINDOW_SIZE);
};
