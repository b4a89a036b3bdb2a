use core::fmt;

/// How a 64-bit value is squeezed into a 32-bit register.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum AddressPolicy {
    /// Reject values with any of the upper 32 bits set.
    #[default]
    Strict,
    /// Drop the upper 32 bits without checking.
    Truncate,
}

/// A value did not fit into a 32-bit register under [`AddressPolicy::Strict`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("value {value:#x} does not fit into a 32-bit register")]
pub struct NarrowingError {
    /// The rejected value.
    pub value: u64,
}

/// Narrow a 64-bit value into a 32-bit register value.
///
/// # Errors
/// Returns [`NarrowingError`] if `policy` is [`AddressPolicy::Strict`] and
/// `value` exceeds `u32::MAX`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn narrow(value: u64, policy: AddressPolicy) -> Result<u32, NarrowingError> {
    match policy {
        AddressPolicy::Truncate => Ok(value as u32),
        AddressPolicy::Strict => {
            if value >> 32 != 0 {
                Err(NarrowingError { value })
            } else {
                Ok(value as u32)
            }
        }
    }
}

/// An address in device memory (kernel code, arguments, DMA targets).
///
/// The driver never checks that device memory behind this address is valid;
/// the caller owns device buffers.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DeviceAddress(u64);

/// An address of host memory as seen by the DMA engine (bus address).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HostAddress(u64);

macro_rules! impl_address {
    ($name:ident, $label:literal) => {
        impl $name {
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

            /// Narrow into a 32-bit register value.
            ///
            /// # Errors
            /// See [`narrow`].
            #[inline]
            pub const fn narrow(self, policy: AddressPolicy) -> Result<u32, NarrowingError> {
                narrow(self.0, policy)
            }

            /// Offset this address by `bytes`, wrapping on overflow.
            #[inline]
            #[must_use]
            pub const fn wrapping_add(self, bytes: u64) -> Self {
                Self(self.0.wrapping_add(bytes))
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(v: u64) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({:#018x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

impl_address!(DeviceAddress, "DeviceAddress");
impl_address!(HostAddress, "HostAddress");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_accepts_32_bit_values() {
        assert_eq!(narrow(0xA000_0000, AddressPolicy::Strict), Ok(0xA000_0000));
        assert_eq!(narrow(u64::from(u32::MAX), AddressPolicy::Strict), Ok(u32::MAX));
    }

    #[test]
    fn strict_rejects_high_bits() {
        let err = narrow(0x1_0000_0000, AddressPolicy::Strict).unwrap_err();
        assert_eq!(err.value, 0x1_0000_0000);
    }

    #[test]
    fn truncate_drops_high_bits() {
        assert_eq!(
            narrow(0x0000_0001_A000_0000, AddressPolicy::Truncate),
            Ok(0xA000_0000)
        );
    }

    #[test]
    fn typed_addresses_narrow_and_format() {
        let da = DeviceAddress::new(0xA100_0000);
        assert_eq!(da.narrow(AddressPolicy::Strict), Ok(0xA100_0000));
        assert_eq!(format!("{da:?}"), "DeviceAddress(0x00000000a1000000)");
        assert_eq!(format!("{da}"), "0xa1000000");

        let ha = HostAddress::new(0x1000).wrapping_add(0x40);
        assert_eq!(u64::from(ha), 0x1040);
    }
}
