//! # Subsystem Controllers
//!
//! One controller per register block. A controller only knows its block's
//! base (and the narrowing policy where it writes addresses); the register
//! I/O object is passed into every operation, so ownership of the device
//! stays with the [`Session`](crate::Session).
//!
//! Every operation writes its registers in a fixed order. Operations that
//! narrow 64-bit values do so before the first write, so a rejected value
//! never leaves a half-programmed block behind.

mod dma;
mod l2;
mod mmu;
mod reset;
mod sm;

pub use dma::{DmaController, DmaTransfer};
pub use l2::L2Controller;
pub use mmu::MmuController;
pub use reset::ResetController;
pub use sm::SmController;

use gpu_registers::{RegisterAddress, RegisterIo, Strobe};

/// Write a single-bit strobe and trace it.
#[inline]
fn strobe<R>(io: &mut R, register: RegisterAddress, name: &str, value: Strobe)
where
    R: RegisterIo + ?Sized,
{
    log::trace!("{name} @ {register} <- {}", value.into_bits());
    io.write(register, value.into_bits());
}

/// Write a raw register value and trace it.
#[inline]
fn write<R>(io: &mut R, register: RegisterAddress, name: &str, value: u32)
where
    R: RegisterIo + ?Sized,
{
    log::trace!("{name} @ {register} <- {value:#010x}");
    io.write(register, value);
}
