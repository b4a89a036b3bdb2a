use crate::RegisterAddress;

/// Single-shot 32-bit register access.
///
/// Implementations must perform exactly one access per call, in call order,
/// without caching, merging or eliding any of them. There is no error path:
/// an address outside the register window is a programming defect.
pub trait RegisterIo {
    fn read(&mut self, address: RegisterAddress) -> u32;
    fn write(&mut self, address: RegisterAddress, value: u32);
}

impl<T> RegisterIo for &mut T
where
    T: RegisterIo + ?Sized,
{
    #[inline]
    fn read(&mut self, address: RegisterAddress) -> u32 {
        (**self).read(address)
    }

    #[inline]
    fn write(&mut self, address: RegisterAddress, value: u32) {
        (**self).write(address, value);
    }
}

/// Direct memory-mapped register access through volatile loads and stores.
///
/// Owning an `Mmio` stands for exclusive access to the device's register
/// window; it is deliberately neither `Clone` nor `Copy`.
#[cfg(feature = "mmio")]
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

#[cfg(feature = "mmio")]
impl Mmio {
    /// # Safety
    /// - The device's register window must be mapped at its physical address
    ///   (identity mapped or otherwise reachable at the addresses passed to
    ///   [`RegisterIo`]) with an uncached, device memory type.
    /// - No other `Mmio` (or other code) may access the window concurrently.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(feature = "mmio")]
impl RegisterIo for Mmio {
    #[inline]
    fn read(&mut self, address: RegisterAddress) -> u32 {
        // SAFETY: `Mmio::new` requires the window to be mapped and exclusively owned.
        unsafe { core::ptr::read_volatile(address.as_ptr()) }
    }

    #[inline]
    fn write(&mut self, address: RegisterAddress, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(address.as_ptr(), value) }
    }
}

#[cfg(all(test, feature = "mmio"))]
mod tests {
    use super::*;

    #[test]
    fn mmio_accesses_the_addressed_word() {
        let mut window = [0u32; 4];
        let base = window.as_mut_ptr() as u64;
        let mut io = unsafe { Mmio::new() };

        io.write(RegisterAddress::new(base + 8), 0xDEAD_BEEF);
        assert_eq!(io.read(RegisterAddress::new(base + 8)), 0xDEAD_BEEF);
        assert_eq!(window, [0, 0, 0xDEAD_BEEF, 0]);
    }

    #[test]
    fn borrowed_io_forwards() {
        fn poke(mut io: impl RegisterIo, at: RegisterAddress) {
            io.write(at, 7);
        }

        let mut word = 0u32;
        let at = RegisterAddress::new((&raw mut word) as u64);
        let mut io = unsafe { Mmio::new() };
        poke(&mut io, at);
        assert_eq!(io.read(at), 7);
    }
}
