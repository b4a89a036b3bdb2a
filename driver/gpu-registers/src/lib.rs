//! # Accelerator Register Interface
//!
//! The lowest layer of the bring-up driver: typed addresses, the fixed
//! register map of the device and the [`RegisterIo`] seam through which every
//! higher layer touches hardware state.
//!
//! ## Register Map
//!
//! The device exposes one MMIO window. Each subsystem owns a fixed block of
//! 32-bit registers inside it:
//!
//! | Block | Offset from [`DeviceBase`] | Module |
//! |-------|----------------------------|--------|
//! | Control   | `0x0000` | [`map::control`] |
//! | MMU       | `0x1000` | [`map::mmu`] |
//! | L2 cache  | `0x2000` | [`map::l2`] |
//! | SM        | `0x4000` | [`map::sm`] |
//! | DMA       | `0x8000` | [`map::dma`] |
//! | Interrupt | `0xA000` | [`map::interrupt`] |
//!
//! Blocks never move at runtime; [`DeviceBase::block`] and
//! [`BlockBase::register`] compute absolute [`RegisterAddress`]es from them.
//!
//! ## Access
//!
//! [`RegisterIo`] is implemented by [`Mmio`] for real hardware (volatile,
//! single-shot 32-bit loads and stores) and by the simulated register file in
//! the `gpu-sim` crate for tests.
//!
//! ```rust
//! # use gpu_registers::*;
//! let base = DeviceBase::new(0x8000_0000);
//! let reset = base.block(RegisterBlock::Control).register(map::control::RESET);
//! assert_eq!(reset.as_u64(), 0x8000_0000);
//!
//! let dma_done = base.block(RegisterBlock::Dma).register(map::dma::DONE);
//! assert_eq!(dma_done.as_u64(), 0x8000_8010);
//! ```
//!
//! ## Address Width
//!
//! Registers are 32 bits wide while device and host addresses are 64 bits.
//! [`AddressPolicy`] decides whether narrowing a wider value is rejected
//! ([`AddressPolicy::Strict`]) or silently truncated
//! ([`AddressPolicy::Truncate`], the legacy behavior).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod address;
mod io;
pub mod map;
mod strobe;

pub use address::{AddressPolicy, DeviceAddress, HostAddress, NarrowingError, narrow};
pub use io::RegisterIo;
#[cfg(feature = "mmio")]
pub use io::Mmio;
pub use map::{BlockBase, DeviceBase, RegisterAddress, RegisterBlock};
pub use strobe::Strobe;
