use bitfield_struct::bitfield;

/// Value written to single-bit trigger registers: RESET, the ENABLE and
/// FLUSH registers, and the START registers of the SM and DMA blocks.
///
/// Only bit 0 is defined; the remaining bits are written as zero.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Strobe {
    /// Bit 0: assert (1) or deassert (0).
    pub set: bool,

    /// Bits 1-31: reserved, written as 0.
    #[bits(31, default = 0)]
    _reserved_1_31: u32,
}

impl Strobe {
    /// `1`: assert reset, enable a unit, flush, or start an operation.
    pub const ASSERT: Self = Self::new().with_set(true);

    /// `0`: deassert.
    pub const DEASSERT: Self = Self::new();

    /// Whether a raw DONE register value signals completion.
    ///
    /// Any nonzero value counts, not just bit 0.
    #[inline]
    #[must_use]
    pub const fn is_done(raw: u32) -> bool {
        raw != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strobe_values() {
        assert_eq!(Strobe::ASSERT.into_bits(), 1);
        assert_eq!(Strobe::DEASSERT.into_bits(), 0);
        assert!(Strobe::from_bits(1).set());
    }

    #[test]
    fn any_nonzero_done_completes() {
        assert!(!Strobe::is_done(0));
        assert!(Strobe::is_done(1));
        assert!(Strobe::is_done(0x8000_0000));
    }
}
