use driver_accessors_derive::Accessors;
use gpu_registers::{AddressPolicy, DeviceAddress, DeviceBase};

/// Static parameters of a bring-up, supplied by the surrounding system.
///
/// ```rust
/// use gpu_driver::BringUpConfig;
/// use gpu_registers::AddressPolicy;
///
/// // A test harness shrinks the reset delay.
/// static CONFIG: BringUpConfig = BringUpConfig::new()
///     .with_reset_hold_cycles(16)
///     .with_address_policy(AddressPolicy::Truncate);
///
/// assert_eq!(CONFIG.reset_hold_cycles(), 16);
/// assert_eq!(CONFIG.device_base().as_u64(), 0x8000_0000);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Accessors)]
pub struct BringUpConfig {
    /// Physical base of the MMIO window.
    device_base: DeviceBase,

    /// Programmed into the MMU's page table base register.
    page_table_base: DeviceAddress,

    /// Spin iterations RESET stays asserted.
    ///
    /// The device has no reset-complete signal; this count is an empirical
    /// "long enough", not a guarantee.
    reset_hold_cycles: u32,

    /// How 64-bit addresses and lengths are narrowed into 32-bit registers.
    address_policy: AddressPolicy,
}

impl BringUpConfig {
    pub const DEFAULT_DEVICE_BASE: u64 = gpu_registers::map::DEFAULT_DEVICE_BASE;
    pub const DEFAULT_PAGE_TABLE_BASE: u64 = 0x9000_0000;
    pub const DEFAULT_RESET_HOLD_CYCLES: u32 = 10_000;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            device_base: DeviceBase::new(Self::DEFAULT_DEVICE_BASE),
            page_table_base: DeviceAddress::new(Self::DEFAULT_PAGE_TABLE_BASE),
            reset_hold_cycles: Self::DEFAULT_RESET_HOLD_CYCLES,
            address_policy: AddressPolicy::Strict,
        }
    }
}

impl Default for BringUpConfig {
    fn default() -> Self {
        Self::new()
    }
}
